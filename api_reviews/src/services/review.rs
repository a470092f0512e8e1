use api_auth::permissions;
use common::{
    error::{AppError, Res},
    misc::UserType,
    validation::{FieldErrors, only_fields},
};
use db::{
    dtos::review::{ReviewCreateRequest, ReviewFilter, ReviewOrdering, ReviewUpdateRequest},
    models::review::Review,
};
use serde_json::Value;
use sqlx::PgPool;

use crate::dtos::review::{ReviewListQuery, ReviewView};

const NOT_CUSTOMER: &str = "Only users with a 'customer' profile can create reviews.";
const NOT_REVIEWER: &str = "Only the review owner may modify this review.";
const ALREADY_REVIEWED: &str = "You have already reviewed this business user.";
const UNIQUE_REVIEW_CONSTRAINT: &str = "unique_review_per_business_and_reviewer";

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

fn parse_id_param(raw: Option<&str>, field: &str, errors: &mut FieldErrors) -> Option<i64> {
    let raw = raw.filter(|v| !v.is_empty())?;
    if !raw.chars().all(|c| c.is_ascii_digit()) {
        errors.add(field, "Must be an integer.");
        return None;
    }
    match raw.parse::<i64>() {
        Ok(id) => Some(id),
        Err(_) => {
            errors.add(field, "Must be an integer.");
            None
        }
    }
}

pub fn parse_list_query(query: &ReviewListQuery) -> Res<ReviewFilter> {
    let mut errors = FieldErrors::new();
    let business_user_id = parse_id_param(
        query.business_user_id.as_deref(),
        "business_user_id",
        &mut errors,
    );
    let reviewer_id = parse_id_param(query.reviewer_id.as_deref(), "reviewer_id", &mut errors);

    let ordering = match query.ordering.as_deref().filter(|v| !v.is_empty()) {
        None => ReviewOrdering::Default,
        Some(raw) => ReviewOrdering::from_param(raw).unwrap_or_else(|| {
            errors.add(
                "ordering",
                format!("Allowed values: {}.", ReviewOrdering::ALLOWED),
            );
            ReviewOrdering::Default
        }),
    };

    errors.into_result()?;
    Ok(ReviewFilter {
        business_user_id,
        reviewer_id,
        ordering,
    })
}

/// Reads an integer field, accepting numeric strings. Missing keys yield `None` without error.
fn integer_field(body: &Value, field: &str, errors: &mut FieldErrors) -> Option<i64> {
    let value = body.get(field)?;
    let parsed = match value {
        Value::Null => {
            errors.add(field, "This field may not be null.");
            return None;
        }
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    if parsed.is_none() {
        errors.add(field, "A valid integer is required.");
    }
    parsed
}

fn check_rating(rating: i64, errors: &mut FieldErrors) -> Option<i32> {
    if rating < MIN_RATING {
        errors.add(
            "rating",
            format!("Ensure this value is greater than or equal to {}.", MIN_RATING),
        );
        None
    } else if rating > MAX_RATING {
        errors.add(
            "rating",
            format!("Ensure this value is less than or equal to {}.", MAX_RATING),
        );
        None
    } else {
        i32::try_from(rating).ok()
    }
}

fn description_field(body: &Value, errors: &mut FieldErrors) -> Option<String> {
    match body.get("description")? {
        Value::String(s) => Some(s.clone()),
        Value::Null => {
            errors.add("description", "This field may not be null.");
            None
        }
        _ => {
            errors.add("description", "Not a valid string.");
            None
        }
    }
}

/// Shape checks of a new review that need no database access.
#[derive(Debug)]
pub struct NewReview {
    pub business_user_id: i64,
    pub rating: i32,
    pub description: String,
}

pub fn validate_new_review(body: &Value) -> Res<NewReview> {
    let mut errors = FieldErrors::new();

    let business_user_id = integer_field(body, "business_user", &mut errors);
    if body.get("business_user").is_none() {
        errors.add("business_user", "This field is required.");
    }
    let rating = integer_field(body, "rating", &mut errors).and_then(|r| check_rating(r, &mut errors));
    if body.get("rating").is_none() {
        errors.add("rating", "This field is required.");
    }
    let description = description_field(body, &mut errors).unwrap_or_default();

    match (business_user_id, rating) {
        (Some(business_user_id), Some(rating)) if errors.is_empty() => Ok(NewReview {
            business_user_id,
            rating,
            description,
        }),
        _ => Err(AppError::Validation(errors)),
    }
}

pub fn validate_review_patch(body: &Value) -> Res<ReviewUpdateRequest> {
    only_fields(body, &["rating", "description"])?;
    let mut errors = FieldErrors::new();
    let rating = integer_field(body, "rating", &mut errors).and_then(|r| check_rating(r, &mut errors));
    let description = description_field(body, &mut errors);
    errors.into_result()?;
    Ok(ReviewUpdateRequest {
        rating,
        description,
    })
}

pub async fn list_reviews(pool: &PgPool, filter: ReviewFilter) -> Res<Vec<ReviewView>> {
    let reviews = db::review::get_reviews(pool, filter).await?;
    Ok(reviews.into_iter().map(ReviewView::from).collect())
}

/// Checks that the reviewed user exists and runs a business.
async fn ensure_business_target(pool: &PgPool, business_user_id: i64) -> Res<()> {
    let message = match db::profile::get_user_type(pool, business_user_id).await? {
        Some(UserType::Business) => return Ok(()),
        Some(_) => "Target user is not a business.",
        None => match db::user::get_user_by_id(pool, business_user_id).await {
            Ok(_) => "Target user is not a business.",
            Err(AppError::Database(sqlx::Error::RowNotFound)) => "Business user not found.",
            Err(err) => return Err(err),
        },
    };
    Err(AppError::field("business_user", message))
}

fn already_reviewed() -> AppError {
    AppError::field("non_field_errors", ALREADY_REVIEWED)
}

/// Creates the caller's single review of a business user.
pub async fn create_review(pool: &PgPool, reviewer_id: i64, body: &Value) -> Res<ReviewView> {
    permissions::require_user_type(pool, reviewer_id, UserType::Customer, NOT_CUSTOMER).await?;
    let review = validate_new_review(body)?;
    ensure_business_target(pool, review.business_user_id).await?;

    if review.business_user_id == reviewer_id {
        return Err(AppError::field("business_user", "You cannot review yourself."));
    }
    if db::review::exists_review(pool, review.business_user_id, reviewer_id).await? {
        return Err(already_reviewed());
    }

    let created = db::review::insert_review(
        pool,
        ReviewCreateRequest {
            business_user_id: review.business_user_id,
            reviewer_id,
            rating: review.rating,
            description: review.description,
        },
    )
    .await
    .map_err(|err| match err {
        AppError::Database(sqlx::Error::Database(ref db_err))
            if db_err.constraint() == Some(UNIQUE_REVIEW_CONSTRAINT) =>
        {
            already_reviewed()
        }
        other => other,
    })?;

    log::info!(
        "Review {} created by user {} for business {}",
        created.id,
        reviewer_id,
        created.business_user_id
    );
    Ok(created.into())
}

async fn get_own_review(pool: &PgPool, caller_id: i64, review_id: i64) -> Res<Review> {
    let review = db::review::get_review(pool, review_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Not found.".to_string()))?;
    if review.reviewer_id != caller_id {
        return Err(AppError::Forbidden(NOT_REVIEWER.to_string()));
    }
    Ok(review)
}

pub async fn update_review(
    pool: &PgPool,
    caller_id: i64,
    review_id: i64,
    body: &Value,
) -> Res<ReviewView> {
    // reject foreign keys before looking the review up
    only_fields(body, &["rating", "description"])?;
    get_own_review(pool, caller_id, review_id).await?;
    let update = validate_review_patch(body)?;
    let review = db::review::update_review(pool, review_id, update).await?;
    Ok(review.into())
}

pub async fn delete_review(pool: &PgPool, caller_id: i64, review_id: i64) -> Res<()> {
    get_own_review(pool, caller_id, review_id).await?;
    db::review::delete_review(pool, review_id).await?;
    log::info!("Review {} deleted by user {}", review_id, caller_id);
    Ok(())
}
