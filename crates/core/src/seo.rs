//! Page metadata (title, description, Open Graph tags) for listing and
//! marketing pages.

use serde::Serialize;

/// Site name appended to every title.
pub const SITE_NAME: &str = "Inmo";

/// Search engines truncate descriptions past this length.
pub const MAX_DESCRIPTION_LENGTH: usize = 160;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub title: String,
    pub description: String,
    pub canonical_url: String,
    /// `(property, content)` pairs for `<meta property="og:*">`.
    pub open_graph: Vec<(String, String)>,
}

/// Facts about a listing needed to describe it.
#[derive(Debug, Clone)]
pub struct ListingFacts<'a> {
    pub id: i64,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub location: &'a str,
    pub price: i64,
    pub currency: &'a str,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub cover_image: &'a str,
}

/// Cut `text` to at most `max` characters on a word boundary, adding an
/// ellipsis when anything was removed.
pub fn truncate_words(text: &str, max: usize) -> String {
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.chars().count() <= max {
        return text;
    }
    let mut out = String::new();
    for word in text.split(' ') {
        let extra = if out.is_empty() { 0 } else { 1 };
        if out.chars().count() + extra + word.chars().count() + 1 > max {
            break;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    if out.is_empty() {
        out = text.chars().take(max.saturating_sub(1)).collect();
    }
    out.push('…');
    out
}

/// Group thousands with commas (`1500000` -> `"1,500,000"`).
pub fn format_price(price: i64) -> String {
    let digits = price.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if price < 0 {
        out.insert(0, '-');
    }
    out
}

pub fn listing_meta(facts: &ListingFacts<'_>, base_url: &str) -> PageMeta {
    let base = base_url.trim_end_matches('/');
    let title = format!("{} en {} | {SITE_NAME}", facts.title, facts.location);

    let mut summary = format!(
        "{} {} en {}.",
        facts.currency,
        format_price(facts.price),
        facts.location
    );
    if let Some(beds) = facts.bedrooms {
        summary.push_str(&format!(" {beds} habitaciones."));
    }
    if let Some(baths) = facts.bathrooms {
        summary.push_str(&format!(" {baths} baños."));
    }
    if let Some(desc) = facts.description.filter(|d| !d.trim().is_empty()) {
        summary.push(' ');
        summary.push_str(desc);
    }
    let description = truncate_words(&summary, MAX_DESCRIPTION_LENGTH);

    let canonical_url = format!("{base}/properties/{}", facts.id);
    let image = if facts.cover_image.starts_with("http") {
        facts.cover_image.to_string()
    } else {
        format!("{base}{}", facts.cover_image)
    };

    PageMeta {
        open_graph: vec![
            ("og:type".into(), "website".into()),
            ("og:site_name".into(), SITE_NAME.into()),
            ("og:title".into(), title.clone()),
            ("og:description".into(), description.clone()),
            ("og:url".into(), canonical_url.clone()),
            ("og:image".into(), image),
        ],
        title,
        description,
        canonical_url,
    }
}

/// Metadata for the static marketing routes. Unknown routes get the
/// not-found page.
pub fn page_meta(route: &str, base_url: &str) -> PageMeta {
    let base = base_url.trim_end_matches('/');
    let route = format!("/{}", route.trim_matches('/'));
    let (title, description) = match route.as_str() {
        "/" => (
            format!("{SITE_NAME} | Propiedades en venta y renta"),
            "Encuentra casas, apartamentos y terrenos publicados por agentes verificados.",
        ),
        "/subscription" => (
            format!("Planes para agentes | {SITE_NAME}"),
            "Elige el plan Bronce, Plata, Oro o Platino y publica tus propiedades.",
        ),
        "/payment-methods" => (
            format!("Métodos de pago | {SITE_NAME}"),
            "Paga tu plan con PayPal, Binance Pay o enlace de pago.",
        ),
        "/portfolio" => (
            format!("Portafolio de agentes | {SITE_NAME}"),
            "Conoce a los agentes y sus propiedades activas.",
        ),
        _ => (
            format!("Página no encontrada | {SITE_NAME}"),
            "La página que buscas no existe.",
        ),
    };
    let canonical_url = format!("{base}{route}");
    PageMeta {
        open_graph: vec![
            ("og:type".into(), "website".into()),
            ("og:site_name".into(), SITE_NAME.into()),
            ("og:title".into(), title.clone()),
            ("og:description".into(), description.to_string()),
            ("og:url".into(), canonical_url.clone()),
        ],
        title,
        description: description.to_string(),
        canonical_url,
    }
}
