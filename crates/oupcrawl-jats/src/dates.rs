use chrono::NaiveDate;

use crate::document::{ArticleDocument, Element};
use crate::error::{ExtractError, Result};

/// Day, month and year as the publisher supplies them, each optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartialDate {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

impl PartialDate {
    pub fn from_element(el: &Element) -> Self {
        let number = |name: &str| {
            el.child(name)
                .and_then(Element::clean_text)
                .and_then(|text| text.parse().ok())
        };
        Self {
            year: number("year").and_then(|y: u32| i32::try_from(y).ok()),
            month: number("month").filter(|m| (1..=12).contains(m)),
            day: number("day"),
        }
    }

    /// Zero-padded `YYYY[-MM[-DD]]`, as long as the components allow.
    pub fn to_iso(&self) -> Option<String> {
        let year = self.year?;
        let Some(month) = self.month else {
            return Some(format!("{year:04}"));
        };
        match self
            .day
            .and_then(|day| NaiveDate::from_ymd_opt(year, month, day))
        {
            Some(date) => Some(date.format("%Y-%m-%d").to_string()),
            None => Some(format!("{year:04}-{month:02}")),
        }
    }
}

fn is_epub(el: &Element) -> bool {
    el.has_attr("pub-type", "epub") || el.has_attr("publication-format", "electronic")
}

fn is_ppub(el: &Element) -> bool {
    el.has_attr("pub-type", "ppub") || el.has_attr("publication-format", "print")
}

/// Publication date of the article, preferring an explicit published date,
/// then the electronic, print, and finally any `pub-date`.
pub fn published_date(doc: &ArticleDocument) -> Option<String> {
    let published = doc
        .find_all("date")
        .filter(|el| el.has_attr("date-type", "published"));
    let epub = doc.find_all("pub-date").filter(|el| is_epub(el));
    let ppub = doc.find_all("pub-date").filter(|el| is_ppub(el));
    let any = doc.find_all("pub-date");

    published
        .chain(epub)
        .chain(ppub)
        .chain(any)
        .map(PartialDate::from_element)
        .find_map(|date| date.to_iso())
}

/// Journal year as the first four characters of the publication date.
pub fn journal_year(date_published: &str) -> Result<i32> {
    date_published
        .get(..4)
        .and_then(|year| year.parse().ok())
        .ok_or_else(|| ExtractError::InvalidPublicationDate(date_published.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(body: &str) -> ArticleDocument {
        ArticleDocument::parse(&format!("<article><front>{body}</front></article>")).unwrap()
    }

    #[test]
    fn full_date_is_zero_padded() {
        let d = doc(r#"<pub-date pub-type="epub"><day>3</day><month>2</month><year>2022</year></pub-date>"#);
        assert_eq!(published_date(&d).as_deref(), Some("2022-02-03"));
    }

    #[test]
    fn missing_day_keeps_year_and_month() {
        let d = doc(r#"<pub-date pub-type="epub"><month>11</month><year>2021</year></pub-date>"#);
        assert_eq!(published_date(&d).as_deref(), Some("2021-11"));
    }

    #[test]
    fn day_without_month_is_dropped() {
        let d = doc(r#"<pub-date><day>12</day><year>2020</year></pub-date>"#);
        assert_eq!(published_date(&d).as_deref(), Some("2020"));
    }

    #[test]
    fn impossible_day_is_dropped() {
        let d = doc(r#"<pub-date><day>31</day><month>2</month><year>2020</year></pub-date>"#);
        assert_eq!(published_date(&d).as_deref(), Some("2020-02"));
    }

    #[test]
    fn published_date_beats_pub_dates() {
        let d = doc(
            r#"<pub-date pub-type="ppub"><year>2019</year></pub-date>
               <pub-date pub-type="epub"><day>1</day><month>12</month><year>2018</year></pub-date>
               <history><date date-type="published"><day>5</day><month>1</month><year>2019</year></date></history>"#,
        );
        assert_eq!(published_date(&d).as_deref(), Some("2019-01-05"));
    }

    #[test]
    fn epub_beats_ppub() {
        let d = doc(
            r#"<pub-date pub-type="ppub"><month>3</month><year>2019</year></pub-date>
               <pub-date publication-format="electronic"><month>1</month><year>2019</year></pub-date>"#,
        );
        assert_eq!(published_date(&d).as_deref(), Some("2019-01"));
    }

    #[test]
    fn candidate_without_year_falls_through() {
        let d = doc(
            r#"<pub-date pub-type="epub"><month>1</month></pub-date>
               <pub-date pub-type="ppub"><year>2017</year></pub-date>"#,
        );
        assert_eq!(published_date(&d).as_deref(), Some("2017"));
    }

    #[test]
    fn no_date_at_all() {
        assert_eq!(published_date(&doc("<article-meta/>")), None);
    }

    #[test]
    fn journal_year_slices_the_date_string() {
        assert_eq!(journal_year("2022-02-03").unwrap(), 2022);
        assert_eq!(journal_year("2021").unwrap(), 2021);
        assert_eq!(journal_year("0099-01").unwrap(), 99);
    }

    #[test]
    fn journal_year_needs_four_digits() {
        assert!(matches!(
            journal_year(""),
            Err(ExtractError::InvalidPublicationDate(_))
        ));
        assert!(journal_year("202").is_err());
        assert!(journal_year("20x2-01").is_err());
    }
}
