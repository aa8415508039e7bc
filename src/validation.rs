//! Pure validation gates for reception and order payloads.
//!
//! No state is touched here; every check returns either acceptance or a
//! precise Persian rejection reason. Order rejections reference the 1-based
//! position of the failing order in its batch.

use chrono::NaiveDate;

use crate::calendar;
use crate::errors::ServiceError;
use crate::models::{CarStatus, OrderChannel};
use crate::services::receptions::{CreateReceptionRequest, OrderPayload};

const CAR_NAME_MAX: usize = 30;
const CHASSIS_NUMBER_MAX: usize = 20;

fn reject(message: String) -> ServiceError {
    ServiceError::ValidationError(message)
}

/// Checks a reception payload; returns the canonical Gregorian reception
/// date on acceptance.
pub fn validate_reception_payload(
    request: &CreateReceptionRequest,
) -> Result<NaiveDate, ServiceError> {
    if request.reception_number.trim().is_empty() {
        return Err(reject(
            "شماره پذیرش وارد نشده یا معتبر نیست.".to_string(),
        ));
    }

    if request.reception_date.trim().is_empty() {
        return Err(reject(
            "تاریخ پذیرش وارد نشده یا معتبر نیست.".to_string(),
        ));
    }

    let reception_date = calendar::parse_jalali_date(&request.reception_date)
        .ok_or_else(|| reject("فرمت تاریخ پذیرش صحیح نیست.".to_string()))?;

    if CarStatus::from_label(&request.car_status).is_none() {
        return Err(reject(format!(
            "وضعیت خودرو نامعتبر است. باید یکی از این گزینه‌ها باشد: {}",
            CarStatus::allowed_labels().join("، ")
        )));
    }

    let car_name = request.car_name.trim();
    if car_name.is_empty() || car_name.chars().count() > CAR_NAME_MAX {
        return Err(reject(
            "نام خودرو الزامی است و نباید بیشتر از ۳۰ کاراکتر باشد.".to_string(),
        ));
    }

    if let Some(chassis) = &request.chassis_number {
        if chassis.trim().chars().count() > CHASSIS_NUMBER_MAX {
            return Err(reject(
                "شماره شاسی نباید بیشتر از ۲۰ کاراکتر باشد.".to_string(),
            ));
        }
    }

    if request.orders.is_empty() {
        return Err(reject(
            "لیست سفارش‌ها خالی یا معتبر نیست.".to_string(),
        ));
    }

    Ok(reception_date)
}

/// Checks one order payload at the given 0-based position in its batch.
pub fn validate_order_payload(order: &OrderPayload, index: usize) -> Result<(), ServiceError> {
    let position = index + 1;

    if order.order_number.trim().is_empty()
        || order.piece_name.trim().is_empty()
        || order.number_of_pieces <= 0
        || order.order_channel.trim().is_empty()
    {
        return Err(reject(format!(
            "فیلدهای ضروری سفارش شماره {position} ناقص یا اشتباه است."
        )));
    }

    let channel = OrderChannel::from_label(&order.order_channel).ok_or_else(|| {
        reject(format!(
            "کانال سفارش نامعتبر است. باید یکی از این گزینه‌ها باشد: {}",
            OrderChannel::allowed_labels().join("، ")
        ))
    })?;

    // Open-market parts are bought externally and may omit the part code;
    // every company channel requires it.
    if channel != OrderChannel::OpenMarket {
        let part_id_present = order
            .part_id
            .as_deref()
            .map(str::trim)
            .is_some_and(|s| !s.is_empty());
        if !part_id_present {
            return Err(reject(format!(
                "کد قطعه (part_id) برای سفارش‌های غیر بازار آزاد الزامی است. (سفارش شماره {position})"
            )));
        }
    }

    Ok(())
}
