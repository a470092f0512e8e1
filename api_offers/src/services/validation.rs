use std::collections::BTreeSet;

use common::{
    error::{AppError, Res},
    misc::OfferType,
    pagination::PageRequest,
    validation::FieldErrors,
};
use db::dtos::offer::{OfferDetailUpdateRequest, OfferFilter, OfferOrdering};
use rust_decimal::Decimal;

use crate::dtos::offer::{OfferCreateBody, OfferDetailInput, OfferListQuery, OfferPatchBody};

pub const TITLE_MAX_LENGTH: usize = 200;
/// NUMERIC(10, 2) holds at most eight integer digits.
const PRICE_LIMIT: i64 = 100_000_000;

const REQUIRED: &str = "This field is required.";

/// Parses listing filters, ordering and the page window.
pub fn parse_list_query(query: &OfferListQuery) -> Res<(OfferFilter, PageRequest)> {
    let mut errors = FieldErrors::new();
    let mut filter = OfferFilter::default();

    if let Some(raw) = query.creator_id.as_deref() {
        match parse_unsigned(raw) {
            Some(id) => filter.creator_id = Some(id),
            None => errors.add("creator_id", "Must be an integer."),
        }
    }

    if let Some(raw) = query.min_price.as_deref() {
        match raw.trim().parse::<Decimal>() {
            Ok(price) => filter.min_price = Some(price),
            Err(_) => errors.add("min_price", "Must be a number."),
        }
    }

    if let Some(raw) = query.max_delivery_time.as_deref() {
        match parse_unsigned(raw).and_then(|days| i32::try_from(days).ok()) {
            Some(days) => filter.max_delivery_time = Some(days),
            None => errors.add("max_delivery_time", "Must be an integer."),
        }
    }

    filter.search = query.search.clone().filter(|s| !s.is_empty());

    if let Some(raw) = query.ordering.as_deref().filter(|o| !o.is_empty()) {
        match OfferOrdering::from_param(raw) {
            Some(ordering) => filter.ordering = ordering,
            None => errors.add(
                "ordering",
                format!("Allowed values: {}.", OfferOrdering::ALLOWED),
            ),
        }
    }

    errors.into_result()?;

    let page = PageRequest::parse(query.page.as_deref(), query.page_size.as_deref())?;
    Ok((filter, page))
}

/// Digits only, like a path converter: no sign, no whitespace.
fn parse_unsigned(raw: &str) -> Option<i64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

/// A fully validated tier ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOfferDetail {
    pub title: String,
    pub revisions: i32,
    pub delivery_time_in_days: i32,
    pub price: Decimal,
    pub features: Vec<String>,
    pub offer_type: OfferType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOffer {
    pub title: String,
    pub image: Option<String>,
    pub description: String,
    pub details: Vec<NewOfferDetail>,
}

fn check_title(errors: &mut FieldErrors, field: &str, title: &str) {
    if title.trim().is_empty() {
        errors.add(field, "This field may not be blank.");
    } else if title.chars().count() > TITLE_MAX_LENGTH {
        errors.add(
            field,
            format!("Ensure this field has no more than {} characters.", TITLE_MAX_LENGTH),
        );
    }
}

fn check_image(errors: &mut FieldErrors, image: &str) {
    let valid = url::Url::parse(image)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
        .unwrap_or(false);
    if !valid {
        errors.add("image", "Enter a valid URL.");
    }
}

/// Bounds shared by create and patch. `label` prefixes messages with the tier.
fn check_detail_values(errors: &mut FieldErrors, label: &str, detail: &OfferDetailInput) {
    if let Some(title) = detail.title.as_deref() {
        if title.trim().is_empty() {
            errors.add("details", format!("{}: title may not be blank.", label));
        } else if title.chars().count() > TITLE_MAX_LENGTH {
            errors.add(
                "details",
                format!("{}: title may have no more than {} characters.", label, TITLE_MAX_LENGTH),
            );
        }
    }
    if let Some(revisions) = detail.revisions {
        if revisions < 0 {
            errors.add("details", format!("{}: revisions must be >= 0.", label));
        }
    }
    if let Some(days) = detail.delivery_time_in_days {
        if days < 1 {
            errors.add("details", format!("{}: delivery_time_in_days must be >= 1.", label));
        }
    }
    if let Some(price) = detail.price {
        if price.is_sign_negative() && !price.is_zero() {
            errors.add("details", format!("{}: price must be >= 0.", label));
        } else if price.scale() > 2 && price.normalize().scale() > 2 {
            errors.add(
                "details",
                format!("{}: price may have no more than 2 decimal places.", label),
            );
        } else if price >= Decimal::from(PRICE_LIMIT) {
            errors.add(
                "details",
                format!("{}: price may have no more than 10 digits in total.", label),
            );
        }
    }
}

fn detail_label(index: usize, detail: &OfferDetailInput) -> String {
    detail
        .offer_type
        .clone()
        .unwrap_or_else(|| format!("details[{}]", index))
}

/// Validates an offer with its tiers. An offer is created with exactly one
/// detail per tier: basic, standard and premium.
pub fn validate_new_offer(body: &OfferCreateBody) -> Res<NewOffer> {
    let mut errors = FieldErrors::new();

    match body.title.as_deref() {
        Some(title) => check_title(&mut errors, "title", title),
        None => errors.add("title", REQUIRED),
    }

    let image = body.image.clone().filter(|i| !i.is_empty());
    if let Some(image) = image.as_deref() {
        check_image(&mut errors, image);
    }

    let mut details = Vec::new();
    match body.details.as_deref() {
        None => errors.add("details", REQUIRED),
        Some(inputs) if inputs.len() != 3 => {
            errors.add("details", "An offer must contain exactly 3 details.")
        }
        Some(inputs) => {
            let types: Vec<Option<OfferType>> = inputs
                .iter()
                .map(|d| d.offer_type.as_deref().and_then(OfferType::from_str))
                .collect();
            if types.iter().any(Option::is_none) {
                errors.add(
                    "details",
                    "offer_type must be one of: basic, standard, premium.",
                );
            } else if types.iter().collect::<BTreeSet<_>>().len() != types.len() {
                errors.add("details", "Each detail must have a unique offer_type.");
            }

            for (index, (input, offer_type)) in inputs.iter().zip(types).enumerate() {
                let label = detail_label(index, input);
                let before = errors.clone();
                check_detail_values(&mut errors, &label, input);
                for (field, present) in [
                    ("title", input.title.is_some()),
                    ("delivery_time_in_days", input.delivery_time_in_days.is_some()),
                    ("price", input.price.is_some()),
                ] {
                    if !present {
                        errors.add("details", format!("{}: {} is required.", label, field));
                    }
                }
                if errors != before {
                    continue;
                }
                if let (Some(offer_type), Some(title), Some(days), Some(price)) = (
                    offer_type,
                    input.title.as_deref(),
                    input.delivery_time_in_days,
                    input.price,
                ) {
                    details.push(NewOfferDetail {
                        title: title.to_string(),
                        revisions: input.revisions.unwrap_or(0),
                        delivery_time_in_days: days,
                        price,
                        features: input.features.clone().unwrap_or_default(),
                        offer_type,
                    });
                }
            }
        }
    }

    errors.into_result()?;

    let Some(title) = body.title.clone() else {
        return Err(AppError::field("title", REQUIRED));
    };
    details.sort_by_key(|d| d.offer_type);
    Ok(NewOffer {
        title,
        image,
        description: body.description.clone().unwrap_or_default(),
        details,
    })
}

/// Validated patch of one existing tier, addressed by its type.
#[derive(Debug, Clone)]
pub struct DetailPatch {
    pub id: Option<i64>,
    pub offer_type: OfferType,
    pub update: OfferDetailUpdateRequest,
}

/// Validates the offer-level fields and every detail patch of an offer patch.
pub fn validate_offer_patch(body: &OfferPatchBody) -> Res<Vec<DetailPatch>> {
    let mut errors = FieldErrors::new();

    if let Some(title) = body.title.as_deref() {
        check_title(&mut errors, "title", title);
    }
    if let Some(Some(image)) = body.image.as_ref() {
        if !image.is_empty() {
            check_image(&mut errors, image);
        }
    }

    let mut patches = Vec::new();
    for (index, input) in body.details.iter().flatten().enumerate() {
        let label = detail_label(index, input);
        let Some(raw_type) = input.offer_type.as_deref() else {
            errors.add("details", "Each detail must include offer_type.");
            continue;
        };
        let Some(offer_type) = OfferType::from_str(raw_type) else {
            errors.add(
                "details",
                format!("\"{}\" is not a valid offer_type.", raw_type),
            );
            continue;
        };
        check_detail_values(&mut errors, &label, input);
        patches.push(DetailPatch {
            id: input.id,
            offer_type,
            update: OfferDetailUpdateRequest {
                title: input.title.clone(),
                revisions: input.revisions,
                delivery_time_in_days: input.delivery_time_in_days,
                price: input.price,
                features: input.features.clone(),
            },
        });
    }

    errors.into_result()?;
    Ok(patches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: serde_json::Value) -> OfferCreateBody {
        serde_json::from_value(value).unwrap()
    }

    fn tier(offer_type: &str, price: serde_json::Value) -> serde_json::Value {
        json!({
            "title": format!("{} design", offer_type),
            "revisions": 2,
            "delivery_time_in_days": 5,
            "price": price,
            "features": ["Logo"],
            "offer_type": offer_type
        })
    }

    fn details_error(result: Res<NewOffer>) -> bool {
        matches!(result, Err(AppError::Validation(ref e)) if e.contains("details"))
    }

    #[test]
    fn accepts_three_distinct_tiers() {
        let offer = validate_new_offer(&body(json!({
            "title": "Grafikdesign-Paket",
            "details": [tier("premium", json!(500)), tier("basic", json!("100.00")), tier("standard", json!(200.5))]
        })))
        .unwrap();
        assert_eq!(offer.description, "");
        let types: Vec<_> = offer.details.iter().map(|d| d.offer_type).collect();
        assert_eq!(types, OfferType::ALL.to_vec());
        assert_eq!(offer.details[0].price, Decimal::new(10000, 2));
    }

    #[test]
    fn rejects_wrong_tier_count_and_duplicates() {
        assert!(details_error(validate_new_offer(&body(json!({
            "title": "x",
            "details": [tier("basic", json!(1)), tier("standard", json!(1))]
        })))));
        assert!(details_error(validate_new_offer(&body(json!({
            "title": "x",
            "details": [tier("basic", json!(1)), tier("basic", json!(1)), tier("premium", json!(1))]
        })))));
        assert!(details_error(validate_new_offer(&body(json!({ "title": "x" })))));
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut slow = tier("basic", json!(10));
        slow["delivery_time_in_days"] = json!(0);
        assert!(details_error(validate_new_offer(&body(json!({
            "title": "x",
            "details": [slow, tier("standard", json!(1)), tier("premium", json!(1))]
        })))));

        assert!(details_error(validate_new_offer(&body(json!({
            "title": "x",
            "details": [tier("basic", json!(-1)), tier("standard", json!(1)), tier("premium", json!(1))]
        })))));

        let result = validate_new_offer(&body(json!({
            "title": "t".repeat(TITLE_MAX_LENGTH + 1),
            "image": "not a url",
            "details": [tier("basic", json!(1)), tier("standard", json!(1)), tier("premium", json!(1))]
        })));
        match result {
            Err(AppError::Validation(errors)) => {
                assert!(errors.contains("title"));
                assert!(errors.contains("image"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn patch_requires_known_offer_type() {
        let patch: OfferPatchBody = serde_json::from_value(json!({
            "details": [{ "title": "no type" }]
        }))
        .unwrap();
        assert!(validate_offer_patch(&patch).is_err());

        let patch: OfferPatchBody = serde_json::from_value(json!({
            "image": null,
            "details": [{ "offer_type": "basic", "price": 120 }]
        }))
        .unwrap();
        let patches = validate_offer_patch(&patch).unwrap();
        assert_eq!(patches[0].offer_type, OfferType::Basic);
        assert_eq!(patches[0].update.price, Some(Decimal::from(120)));
        assert_eq!(patch.image, Some(None));
    }

    #[test]
    fn parses_listing_query() {
        let (filter, page) = parse_list_query(&OfferListQuery {
            creator_id: Some("3".into()),
            min_price: Some("50.5".into()),
            max_delivery_time: Some("7".into()),
            ordering: Some("-min_price".into()),
            page_size: Some("2".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(filter.creator_id, Some(3));
        assert_eq!(filter.min_price, Some(Decimal::new(505, 1)));
        assert_eq!(filter.max_delivery_time, Some(7));
        assert_eq!(filter.ordering, OfferOrdering::MinPriceDesc);
        assert_eq!(page.page_size, 2);

        for query in [
            OfferListQuery { creator_id: Some("abc".into()), ..Default::default() },
            OfferListQuery { creator_id: Some("-1".into()), ..Default::default() },
            OfferListQuery { min_price: Some("cheap".into()), ..Default::default() },
            OfferListQuery { max_delivery_time: Some("1.5".into()), ..Default::default() },
            OfferListQuery { ordering: Some("title".into()), ..Default::default() },
        ] {
            assert!(matches!(parse_list_query(&query), Err(AppError::Validation(_))));
        }
    }
}
