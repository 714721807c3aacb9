//! Tariff DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::domain::tariff::{TariffLine, TariffQuote};

/// One priced sub-interval of a stay
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TariffLineDto {
    pub shift_id: i32,
    pub shift_code: String,
    pub rate_id: i32,
    pub hourly_amount: Decimal,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub minutes: i64,
    pub billed_hours: Decimal,
    pub amount: Decimal,
}

impl From<&TariffLine> for TariffLineDto {
    fn from(line: &TariffLine) -> Self {
        Self {
            shift_id: line.shift_id,
            shift_code: line.shift_code.clone(),
            rate_id: line.rate_id,
            hourly_amount: line.hourly_amount,
            starts_at: line.starts_at,
            ends_at: line.ends_at,
            minutes: (line.seconds + 59) / 60,
            billed_hours: line.billed_hours,
            amount: line.amount,
        }
    }
}

/// Price a hypothetical stay
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_window"))]
pub struct TariffPreviewRequest {
    #[validate(range(min = 1))]
    pub parking_id: i32,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
}

fn validate_window(req: &TariffPreviewRequest) -> Result<(), ValidationError> {
    if req.exit_time < req.entry_time {
        let mut err = ValidationError::new("window");
        err.message = Some("exit_time must not be before entry_time".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TariffQuoteDto {
    pub parking_id: i32,
    pub billable_minutes: i64,
    pub amount: Decimal,
    pub currency: String,
    /// `per_minute` or `per_started_hour`
    pub rounding: String,
    pub rate_ids: Vec<i32>,
    pub lines: Vec<TariffLineDto>,
}

impl From<TariffQuote> for TariffQuoteDto {
    fn from(q: TariffQuote) -> Self {
        Self {
            parking_id: q.parking_id,
            billable_minutes: q.billable_minutes,
            amount: q.amount,
            currency: q.currency.clone(),
            rounding: q.rounding.as_str().to_string(),
            rate_ids: q.rate_ids(),
            lines: q.lines.iter().map(TariffLineDto::from).collect(),
        }
    }
}
