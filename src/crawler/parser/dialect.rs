//! Markup dialects
//!
//! The listing has been served in several markup generations at once,
//! depending on locale and rollout. A `MarkupDialect` describes one of them as
//! a set of capabilities: how to find review cards, and a selector for each
//! field it can provide. A field the dialect cannot provide is simply absent,
//! and the parser falls through to the next dialect for it. Supporting a new
//! layout means adding a dialect, not editing the others.

use scraper::{ElementRef, Html, Selector};

/// A review field that a dialect may be able to locate inside a card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Score,
    Title,
    ReviewDate,
    Positive,
    Negative,
    GuestName,
    GuestCountry,
    GuestType,
    RoomType,
    StayDate,
    CustomerType,
}

/// One markup generation of the review listing
#[derive(Debug)]
pub struct MarkupDialect {
    name: &'static str,
    cards: Selector,
    containers: Vec<Selector>,
    fields: Vec<(Field, Selector)>,
}

impl MarkupDialect {
    /// Builds a dialect from CSS selectors
    ///
    /// Returns None if the card selector is invalid; invalid field or
    /// container selectors are logged and left out.
    pub fn new(
        name: &'static str,
        cards: &str,
        containers: &[&str],
        fields: &[(Field, &str)],
    ) -> Option<Self> {
        let cards = compile(name, cards)?;
        let containers = containers
            .iter()
            .filter_map(|css| compile(name, css))
            .collect();
        let fields = fields
            .iter()
            .filter_map(|(field, css)| compile(name, css).map(|selector| (*field, selector)))
            .collect();

        Some(Self {
            name,
            cards,
            containers,
            fields,
        })
    }

    /// The current layout, keyed by `data-testid` attributes
    pub fn test_id() -> Option<Self> {
        Self::new(
            "testid",
            r#"[data-testid="review-card"]"#,
            &[r#"[data-testid="review-list"]"#, r#"[data-testid="reviews-list"]"#],
            &[
                (Field::Score, r#"[data-testid="review-score"]"#),
                (Field::Title, r#"[data-testid="review-title"]"#),
                (Field::ReviewDate, r#"[data-testid="review-date"]"#),
                (Field::Positive, r#"[data-testid="review-positive-text"]"#),
                (Field::Negative, r#"[data-testid="review-negative-text"]"#),
                (Field::GuestName, r#"[data-testid="reviewer-name"]"#),
                (Field::GuestCountry, r#"[data-testid="reviewer-country"]"#),
                (Field::GuestType, r#"[data-testid="reviewer-type"]"#),
                (Field::RoomType, r#"[data-testid="review-room-type"]"#),
                (Field::StayDate, r#"[data-testid="review-stay-date"]"#),
                (Field::CustomerType, r#"[data-testid="review-customer-type"]"#),
            ],
        )
    }

    /// The older class-based layout
    pub fn legacy() -> Option<Self> {
        Self::new(
            "legacy",
            ".review_list_new_item_block",
            &["#review_list_page_container", ".review_list"],
            &[
                (Field::Score, ".bui-review-score__badge"),
                (Field::Title, ".review-title, h3"),
                (Field::ReviewDate, ".c-review-block__date"),
                (Field::Positive, ".c-review__row:not(.lalala) .c-review__body"),
                (Field::Negative, ".c-review__row.lalala .c-review__body"),
                (Field::GuestName, ".bui-avatar-block__title"),
                (Field::GuestCountry, ".bui-avatar-block__subtitle"),
                (Field::GuestType, ".review-panel-wide__traveller_type"),
                (Field::RoomType, ".c-review-block__room-link"),
                (Field::StayDate, ".c-review-block__stay-date"),
            ],
        )
    }

    /// schema.org microdata
    pub fn microdata() -> Option<Self> {
        Self::new(
            "microdata",
            r#"[itemprop="review"]"#,
            &[],
            &[
                (Field::Score, r#"[itemprop="ratingValue"]"#),
                (Field::Title, r#"[itemprop="review"] > [itemprop="name"]"#),
                (
                    Field::Title,
                    r#"[itemprop="review"] > :not([itemprop="author"]) > [itemprop="name"]"#,
                ),
                (Field::ReviewDate, r#"[itemprop="datePublished"]"#),
                (Field::Positive, r#"[itemprop="reviewBody"]"#),
                (Field::GuestName, r#"[itemprop="author"]"#),
            ],
        )
    }

    /// All built-in dialects in lookup order
    pub fn builtin() -> Vec<Self> {
        [Self::test_id(), Self::legacy(), Self::microdata()]
            .into_iter()
            .flatten()
            .collect()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether this dialect can locate `field` at all
    pub fn supports(&self, field: Field) -> bool {
        self.fields.iter().any(|(f, _)| *f == field)
    }

    /// Review cards in document order
    pub fn review_cards<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        document.select(&self.cards).collect()
    }

    /// True if the document has this dialect's review list, even an empty one
    pub fn recognizes(&self, document: &Html) -> bool {
        document.select(&self.cards).next().is_some()
            || self
                .containers
                .iter()
                .any(|selector| document.select(selector).next().is_some())
    }

    /// First element inside `card` carrying `field`
    pub fn select_field<'a>(&self, card: ElementRef<'a>, field: Field) -> Option<ElementRef<'a>> {
        self.fields
            .iter()
            .filter(|(f, _)| *f == field)
            .find_map(|(_, selector)| card.select(selector).next())
    }
}

fn compile(dialect: &str, css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            tracing::error!("Dialect {}: invalid selector '{}': {:?}", dialect, css, e);
            None
        }
    }
}
