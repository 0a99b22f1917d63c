//! Catalog item normalization
//!
//! Pure transform plus validation gate: converts one raw catalog item into
//! the local entity shapes. Loosely-typed fields (stringified numbers,
//! optional arrays) are coerced here; a missing required field rejects the
//! whole item so the caller can log and skip it.

use crate::db::works::Work;
use crate::services::catalog_client::{RawEntityRef, RawItem};
use crate::{Error, Result};

/// Stub for a related entity referenced by a work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRef {
    pub id: i64,
    pub name: String,
}

/// Validated work plus everything it references
#[derive(Debug, Clone)]
pub struct NormalizedItem {
    pub work: Work,
    pub makers: Vec<EntityRef>,
    pub genres: Vec<EntityRef>,
    pub series: Vec<EntityRef>,
    pub sample_small_urls: Vec<String>,
    pub sample_large_urls: Vec<String>,
}

/// Normalize one raw catalog item, rejecting it on any missing required field
pub fn normalize_item(raw: &RawItem) -> Result<NormalizedItem> {
    let content_id = required(raw.content_id.as_deref(), "content_id", raw)?;
    let title = required(raw.title.as_deref(), "title", raw)?;
    let date = required(raw.date.as_deref(), "date", raw)?;
    let affiliate_url = required(raw.affiliate_url.as_deref(), "affiliateURL", raw)?;

    let images = raw
        .image_url
        .as_ref()
        .ok_or_else(|| missing("imageURL", raw))?;
    let image_list_url = required(images.list.as_deref(), "imageURL.list", raw)?;
    let image_small_url = required(images.small.as_deref(), "imageURL.small", raw)?;
    let image_large_url = required(images.large.as_deref(), "imageURL.large", raw)?;

    let prices = raw.prices.as_ref().ok_or_else(|| missing("prices", raw))?;
    let price = parse_int(required(prices.price.as_deref(), "prices.price", raw)?, "prices.price", raw)?;
    let list_price = parse_int(
        required(prices.list_price.as_deref(), "prices.list_price", raw)?,
        "prices.list_price",
        raw,
    )?;

    let volume = raw.volume.as_deref().and_then(|v| parse_digits(v));
    let review_count = raw.review.as_ref().and_then(|r| r.count);
    let review_average = raw
        .review
        .as_ref()
        .and_then(|r| r.average.as_deref())
        .and_then(|a| a.trim().parse::<f64>().ok());

    let work = Work {
        id: content_id.to_string(),
        title: title.to_string(),
        volume,
        review_count,
        review_average,
        affiliate_url: affiliate_url.to_string(),
        image_list_url: image_list_url.to_string(),
        image_small_url: image_small_url.to_string(),
        image_large_url: image_large_url.to_string(),
        price,
        list_price,
        release_date: date.to_string(),
    };

    let iteminfo = raw.iteminfo.as_ref();
    let samples = raw.sample_image_url.as_ref();

    Ok(NormalizedItem {
        work,
        makers: entity_refs(iteminfo.map(|i| i.maker.as_slice())),
        genres: entity_refs(iteminfo.map(|i| i.genre.as_slice())),
        series: entity_refs(iteminfo.map(|i| i.series.as_slice())),
        sample_small_urls: samples
            .and_then(|s| s.sample_s.as_ref())
            .map(|l| l.image.clone())
            .unwrap_or_default(),
        sample_large_urls: samples
            .and_then(|s| s.sample_l.as_ref())
            .map(|l| l.image.clone())
            .unwrap_or_default(),
    })
}

fn entity_refs(raw: Option<&[RawEntityRef]>) -> Vec<EntityRef> {
    raw.unwrap_or_default()
        .iter()
        .map(|r| EntityRef {
            id: r.id,
            name: r.name.clone(),
        })
        .collect()
}

fn required<'a>(value: Option<&'a str>, field: &str, raw: &RawItem) -> Result<&'a str> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(missing(field, raw)),
    }
}

fn missing(field: &str, raw: &RawItem) -> Error {
    Error::Parse(format!(
        "missing required field `{}` on item {}",
        field,
        raw.content_id.as_deref().unwrap_or("<no content_id>")
    ))
}

/// Parse a required numeric-looking string, tolerating thousands separators
/// and trailing range markers ("1,320", "300~")
fn parse_int(value: &str, field: &str, raw: &RawItem) -> Result<i64> {
    parse_digits(value).ok_or_else(|| {
        Error::Parse(format!(
            "field `{}` is not numeric ({:?}) on item {}",
            field,
            value,
            raw.content_id.as_deref().unwrap_or("<no content_id>")
        ))
    })
}

fn parse_digits(value: &str) -> Option<i64> {
    let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_item(overrides: serde_json::Value) -> RawItem {
        let mut base = serde_json::json!({
            "content_id": "d_123456",
            "title": "Sample Work",
            "date": "2024-03-01 10:00:00",
            "volume": "32",
            "affiliateURL": "https://example.com/aff",
            "imageURL": {
                "list": "https://example.com/list.jpg",
                "small": "https://example.com/small.jpg",
                "large": "https://example.com/large.jpg"
            },
            "prices": { "price": "770", "list_price": "1,100" },
            "review": { "count": 12, "average": "4.55" },
            "iteminfo": {
                "maker": [{ "id": 42, "name": "Circle A" }],
                "genre": [{ "id": 7, "name": "Comedy" }, { "id": 8, "name": "Drama" }]
            },
            "sampleImageURL": {
                "sample_s": { "image": ["s1.jpg", "s2.jpg"] },
                "sample_l": { "image": ["l1.jpg"] }
            }
        });
        merge(&mut base, overrides);
        serde_json::from_value(base).unwrap()
    }

    fn merge(base: &mut serde_json::Value, overrides: serde_json::Value) {
        if let (Some(base_map), serde_json::Value::Object(over)) =
            (base.as_object_mut(), overrides)
        {
            for (k, v) in over {
                base_map.insert(k, v);
            }
        }
    }

    #[test]
    fn test_full_item_normalizes() {
        let item = normalize_item(&raw_item(serde_json::json!({}))).unwrap();
        assert_eq!(item.work.id, "d_123456");
        assert_eq!(item.work.price, 770);
        assert_eq!(item.work.list_price, 1100);
        assert_eq!(item.work.volume, Some(32));
        assert_eq!(item.work.review_count, Some(12));
        assert_eq!(item.work.review_average, Some(4.55));
        assert_eq!(item.makers.len(), 1);
        assert_eq!(item.makers[0].id, 42);
        assert_eq!(item.genres.len(), 2);
        assert!(item.series.is_empty());
        assert_eq!(item.sample_small_urls, vec!["s1.jpg", "s2.jpg"]);
        assert_eq!(item.sample_large_urls, vec!["l1.jpg"]);
    }

    #[test]
    fn test_missing_price_rejects_item() {
        let result = normalize_item(&raw_item(serde_json::json!({
            "prices": { "list_price": "1100" }
        })));
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test]
    fn test_missing_title_rejects_item() {
        let result = normalize_item(&raw_item(serde_json::json!({ "title": null })));
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test]
    fn test_missing_image_urls_reject_item() {
        let result = normalize_item(&raw_item(serde_json::json!({
            "imageURL": { "list": "x.jpg" }
        })));
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test]
    fn test_non_numeric_price_rejects_item() {
        let result = normalize_item(&raw_item(serde_json::json!({
            "prices": { "price": "free!", "list_price": "1100" }
        })));
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test]
    fn test_optional_fields_default_to_absent() {
        let item = normalize_item(&raw_item(serde_json::json!({
            "volume": null,
            "review": null,
            "iteminfo": null,
            "sampleImageURL": null
        })))
        .unwrap();
        assert_eq!(item.work.volume, None);
        assert_eq!(item.work.review_count, None);
        assert_eq!(item.work.review_average, None);
        assert!(item.makers.is_empty());
        assert!(item.sample_small_urls.is_empty());
    }

    #[test]
    fn test_range_price_parses_to_lower_bound_digits() {
        let item = normalize_item(&raw_item(serde_json::json!({
            "prices": { "price": "300~", "list_price": "300~" }
        })))
        .unwrap();
        assert_eq!(item.work.price, 300);
    }
}
