//! Review page parser
//!
//! Turns one fetched listing page into review records, hotel statistics and
//! a next-page signal. Parsing is pure: the same markup always yields the
//! same output.
//!
//! A single malformed review never fails the page. A card with none of
//! score, title and review date is dropped and counted as skipped; any other
//! missing field takes its empty value. Only a page that is not a review
//! listing at all is a `ParseError`.

mod dialect;
mod pagination;
mod stats;
mod text;

pub use dialect::{Field, MarkupDialect};
pub use pagination::find_next_page;
pub use stats::extract_hotel_stats;

use crate::crawler::fetcher::RawPage;
use crate::model::{Booking, Guest, GuestType, HotelStats, ReviewRecord};
use crate::url::is_absolute_http;
use scraper::{ElementRef, Html, Selector};
use text::{
    clean_text, content_or_text, normalize_language, parse_count, parse_date, parse_decimal,
    parse_review_date_text, parse_timestamp,
};
use thiserror::Error;
use url::Url;

/// Page-level parse failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("page {url} has an empty body")]
    EmptyDocument { url: String },

    #[error("page {url} is not a review listing (title: {title:?})")]
    UnrecognizedLayout { url: String, title: Option<String> },
}

/// Everything extracted from one listing page
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPage {
    /// Accepted records in page order
    pub records: Vec<ReviewRecord>,

    /// Hotel statistics, if the page carried any
    pub stats: Option<HotelStats>,

    /// Whether the site offers a further page
    pub has_next_page: bool,

    /// Resolved URL of the next page, when the site links one
    pub next_page: Option<Url>,

    /// Cards dropped for lacking score, title and review date
    pub skipped_records: usize,

    /// Name of the dialect whose cards were used
    pub dialect: Option<&'static str>,
}

/// Selectors used on every card regardless of dialect
#[derive(Debug)]
struct CardSelectors {
    time: Selector,
    paragraph: Selector,
    image: Selector,
    title: Selector,
}

impl CardSelectors {
    fn new() -> Option<Self> {
        Some(Self {
            time: Selector::parse("time[datetime]").ok()?,
            paragraph: Selector::parse("p").ok()?,
            image: Selector::parse("img").ok()?,
            title: Selector::parse("title").ok()?,
        })
    }
}

/// Parser for review listing pages
#[derive(Debug)]
pub struct ReviewParser {
    dialects: Vec<MarkupDialect>,
    selectors: Option<CardSelectors>,
    language_hint: Option<String>,
}

impl Default for ReviewParser {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ReviewParser {
    /// Creates a parser with the built-in dialects
    ///
    /// `language_hint` is used for reviews whose language the markup does
    /// not state.
    pub fn new(language_hint: Option<String>) -> Self {
        Self::with_dialects(MarkupDialect::builtin(), language_hint)
    }

    /// Creates a parser with a custom dialect list, tried in order
    pub fn with_dialects(dialects: Vec<MarkupDialect>, language_hint: Option<String>) -> Self {
        Self {
            dialects,
            selectors: CardSelectors::new(),
            language_hint: language_hint.as_deref().and_then(normalize_language),
        }
    }

    /// Parses one fetched page
    ///
    /// # Example
    ///
    /// ```
    /// use hotel_review_scraper::crawler::{RawPage, ReviewParser};
    /// use url::Url;
    ///
    /// let page = RawPage {
    ///     url: Url::parse("https://example.com/reviews").unwrap(),
    ///     status: 200,
    ///     body: r#"<div data-testid="review-card">
    ///         <div data-testid="review-score">9,0</div>
    ///         <h3 data-testid="review-title">Superb</h3>
    ///     </div>"#.to_string(),
    /// };
    /// let parsed = ReviewParser::default().parse(&page).unwrap();
    /// assert_eq!(parsed.records[0].score, Some(9.0));
    /// ```
    pub fn parse(&self, page: &RawPage) -> Result<ParsedPage, ParseError> {
        if page.body.trim().is_empty() {
            return Err(ParseError::EmptyDocument {
                url: page.url.to_string(),
            });
        }

        let document = Html::parse_document(&page.body);
        let stats = Some(extract_hotel_stats(&document)).filter(|s| !s.is_empty());

        let (dialect, cards) = self
            .dialects
            .iter()
            .map(|d| (d, d.review_cards(&document)))
            .find(|(_, cards)| !cards.is_empty())
            .map_or((None, Vec::new()), |(d, cards)| (Some(d.name()), cards));

        // Stats alone do not make a listing: an overview page carries them too
        let recognized =
            dialect.is_some() || self.dialects.iter().any(|d| d.recognizes(&document));
        if !recognized {
            return Err(ParseError::UnrecognizedLayout {
                url: page.url.to_string(),
                title: self.document_title(&document),
            });
        }

        let document_language = document
            .root_element()
            .value()
            .attr("lang")
            .and_then(normalize_language);

        let mut records = Vec::with_capacity(cards.len());
        let mut skipped_records = 0;
        for (index, card) in cards.into_iter().enumerate() {
            let record = self.parse_card(card, document_language.as_deref());
            if record.is_blank() {
                tracing::debug!(
                    "Skipping review card {} on {}: no score, title or date",
                    index,
                    page.url
                );
                skipped_records += 1;
                continue;
            }
            records.push(record);
        }

        let next_page = find_next_page(&document, &page.url);

        Ok(ParsedPage {
            records,
            stats,
            has_next_page: next_page.is_some(),
            next_page,
            skipped_records,
            dialect,
        })
    }

    /// Next-page link of a page that failed to parse, so pagination can
    /// step over it
    pub fn next_page_link(&self, page: &RawPage) -> Option<Url> {
        find_next_page(&Html::parse_document(&page.body), &page.url)
    }

    fn document_title(&self, document: &Html) -> Option<String> {
        let selector = &self.selectors.as_ref()?.title;
        document
            .select(selector)
            .next()
            .map(clean_text)
            .filter(|t| !t.is_empty())
    }

    /// First element carrying `field`, trying each dialect in order
    fn field<'a>(&self, card: ElementRef<'a>, field: Field) -> Option<ElementRef<'a>> {
        self.dialects
            .iter()
            .filter(|d| d.supports(field))
            .find_map(|d| d.select_field(card, field))
    }

    fn field_text(&self, card: ElementRef<'_>, field: Field) -> String {
        self.field(card, field)
            .map(content_or_text)
            .unwrap_or_default()
    }

    fn parse_card(&self, card: ElementRef<'_>, document_language: Option<&str>) -> ReviewRecord {
        let stay_node = self.field(card, Field::StayDate);
        let (positive_content, negative_content) = self.parse_review_text(card);
        let guest_type_label = self.field_text(card, Field::GuestType);

        let mut booking = Booking {
            room_type: self.field_text(card, Field::RoomType),
            customer_type: Some(self.field_text(card, Field::CustomerType))
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| guest_type_label.clone()),
            ..Default::default()
        };
        if let Some(stay) = stay_node {
            self.parse_stay(stay, &mut booking);
        }
        booking.reconcile();

        ReviewRecord {
            score: self.parse_score(card),
            review_date: self.parse_review_date(card, stay_node),
            title: self.field_text(card, Field::Title),
            positive_content,
            negative_content,
            language: self.parse_language(card, document_language),
            guest: Guest {
                name: self.field_text(card, Field::GuestName),
                country: self.field_text(card, Field::GuestCountry),
                guest_type: GuestType::from_label(&guest_type_label),
            },
            booking,
            photos: self.parse_photos(card),
        }
    }

    /// Overall score, rejected when outside the 0-10 scale
    fn parse_score(&self, card: ElementRef<'_>) -> Option<f64> {
        let text = self.field_text(card, Field::Score);
        let score = parse_decimal(&text)?;
        if (0.0..=10.0).contains(&score) {
            Some(score)
        } else {
            tracing::debug!("Ignoring out-of-range review score {}", score);
            None
        }
    }

    /// Review timestamp from the date field, else from any `<time>` in the
    /// card that is not part of the stay block
    fn parse_review_date(
        &self,
        card: ElementRef<'_>,
        stay_node: Option<ElementRef<'_>>,
    ) -> Option<i64> {
        let selectors = self.selectors.as_ref()?;

        if let Some(node) = self.field(card, Field::ReviewDate) {
            let machine = node
                .value()
                .attr("datetime")
                .or_else(|| node.value().attr("content"))
                .map(str::to_string)
                .or_else(|| {
                    node.select(&selectors.time)
                        .next()
                        .and_then(|t| t.value().attr("datetime").map(str::to_string))
                });
            if let Some(ts) = machine.as_deref().and_then(parse_timestamp) {
                return Some(ts);
            }
            if let Some(ts) = parse_review_date_text(&clean_text(node)) {
                return Some(ts);
            }
        }

        card.select(&selectors.time)
            .filter(|time| {
                stay_node.map_or(true, |stay| !time.ancestors().any(|a| a.id() == stay.id()))
            })
            .find_map(|time| time.value().attr("datetime").and_then(parse_timestamp))
    }

    /// Positive and negative text; plain paragraphs are the fallback
    fn parse_review_text(&self, card: ElementRef<'_>) -> (String, String) {
        let positive = self.field_text(card, Field::Positive);
        let negative = self.field_text(card, Field::Negative);
        if !positive.is_empty() || !negative.is_empty() {
            return (positive, negative);
        }

        let Some(selectors) = self.selectors.as_ref() else {
            return (positive, negative);
        };
        let paragraphs: Vec<String> = card
            .select(&selectors.paragraph)
            .map(clean_text)
            .filter(|p| !p.is_empty())
            .collect();

        match paragraphs.split_first() {
            Some((first, rest)) => (first.clone(), rest.join(" ")),
            None => (String::new(), String::new()),
        }
    }

    /// Nights from the stay text; check-in/out from contained `<time>`s
    fn parse_stay(&self, stay: ElementRef<'_>, booking: &mut Booking) {
        booking.nights = parse_count(&clean_text(stay));

        let Some(selectors) = self.selectors.as_ref() else {
            return;
        };
        let mut dates = stay
            .select(&selectors.time)
            .filter_map(|t| t.value().attr("datetime").and_then(parse_date));
        booking.check_in = dates.next();
        booking.check_out = dates.next();
    }

    fn parse_language(&self, card: ElementRef<'_>, document_language: Option<&str>) -> String {
        let element = card.value();
        element
            .attr("lang")
            .or_else(|| element.attr("data-review-language"))
            .and_then(normalize_language)
            .or_else(|| document_language.map(str::to_string))
            .or_else(|| self.language_hint.clone())
            .unwrap_or_default()
    }

    /// Absolute image URLs in the card, de-duplicated in page order
    fn parse_photos(&self, card: ElementRef<'_>) -> Vec<String> {
        let Some(selectors) = self.selectors.as_ref() else {
            return Vec::new();
        };

        let mut photos: Vec<String> = Vec::new();
        for img in card.select(&selectors.image) {
            let src = img
                .value()
                .attr("src")
                .filter(|s| !s.trim().is_empty())
                .or_else(|| img.value().attr("data-src"));
            let Some(src) = src.map(str::trim) else {
                continue;
            };
            if is_absolute_http(src) && !photos.iter().any(|p| p == src) {
                photos.push(src.to_string());
            }
        }
        photos
    }
}
