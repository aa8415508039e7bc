mod common;

use axum::http::{Method, StatusCode};
use chrono::NaiveDate;
use sea_orm::{ColumnTrait, DatabaseBackend as DbBackend, EntityTrait, QueryFilter, Statement};
use sea_orm::ConnectionTrait;
use serde_json::{json, Value};

use autoshop_api::entities::{audit_log, order, reception};
use common::TestApp;

fn reception_payload() -> Value {
    json!({
        "reception_number": "R-100",
        "reception_date": "1403/05/12",
        "car_status": "در تعمیرگاه",
        "car_name": "پژو 206",
        "chassis_number": "CH-123456",
        "orders": [
            {
                "order_number": "ORD-1",
                "piece_name": "لنت ترمز",
                "part_id": "P-55",
                "number_of_pieces": 2,
                "order_channel": "نمایندگی",
                "estimated_arrival_days": 3
            },
            {
                "order_number": "ORD-2",
                "piece_name": "شمع",
                "number_of_pieces": 4,
                "order_channel": "بازار آزاد",
                "market_name": "بورس قطعه",
                "market_phone": "09120000000"
            }
        ]
    })
}

#[tokio::test]
async fn create_reception_persists_reception_orders_and_audit() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer("رضایی").await;

    let body = app
        .expect_json(
            Method::POST,
            &format!("/customers/{customer_id}/receptions"),
            &reception_payload(),
            StatusCode::OK,
        )
        .await;

    assert_eq!(body["message"], "سفارش‌ها با موفقیت ثبت شدند.");
    assert_eq!(body["order_count"], 2);
    let reception_id = body["reception_id"].as_i64().expect("reception_id") as i32;

    let stored = reception::Entity::find_by_id(reception_id)
        .one(&*app.db)
        .await
        .expect("query failed")
        .expect("reception missing");
    assert_eq!(stored.customer_id, customer_id);
    assert_eq!(stored.car_name, "پژو 206");
    assert_eq!(
        stored.reception_date,
        NaiveDate::from_ymd_opt(2024, 8, 2).unwrap()
    );

    let orders = order::Entity::find()
        .filter(order::Column::ReceptionId.eq(reception_id))
        .all(&*app.db)
        .await
        .expect("query failed");
    assert_eq!(orders.len(), 2);

    let dealership = orders
        .iter()
        .find(|o| o.order_number == "ORD-1")
        .expect("dealership order");
    assert_eq!(dealership.status, "در انتظار تائید شرکت");
    assert_eq!(dealership.car_name.as_deref(), Some("پژو 206"));
    assert!(dealership.delivery_date.is_none());
    assert!(dealership.estimated_arrival_date.is_some());

    let open_market = orders
        .iter()
        .find(|o| o.order_number == "ORD-2")
        .expect("open market order");
    assert_eq!(open_market.status, "در انتظار تائید حسابداری");
    assert!(open_market.part_id.is_none());
    assert!(open_market.estimated_arrival_date.is_none());

    let audits = audit_log::Entity::find()
        .all(&*app.db)
        .await
        .expect("query failed");
    assert_eq!(audits.len(), 1);
    assert_eq!(audits[0].action, "ثبت پذیرش جدید");
    assert_eq!(audits[0].user_id, 7);
    assert!(audits[0].message.contains("رضایی"));
}

#[tokio::test]
async fn create_reception_rejects_malformed_jalali_date() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer("کریمی").await;

    let mut payload = reception_payload();
    payload["reception_date"] = json!("1403-05-12");

    let body = app
        .expect_json(
            Method::POST,
            &format!("/customers/{customer_id}/receptions"),
            &payload,
            StatusCode::BAD_REQUEST,
        )
        .await;
    assert_eq!(body["message"], "فرمت تاریخ پذیرش صحیح نیست.");

    let orders = order::Entity::find().all(&*app.db).await.expect("query");
    assert!(orders.is_empty());
}

#[tokio::test]
async fn create_reception_requires_part_id_outside_open_market() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer("کریمی").await;

    let mut payload = reception_payload();
    payload["orders"][0]["part_id"] = json!("   ");

    let body = app
        .expect_json(
            Method::POST,
            &format!("/customers/{customer_id}/receptions"),
            &payload,
            StatusCode::BAD_REQUEST,
        )
        .await;
    assert!(body["message"].as_str().unwrap().contains("part_id"));
}

#[tokio::test]
async fn structurally_invalid_body_keeps_the_error_contract() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer("کریمی").await;

    let mut payload = reception_payload();
    payload.as_object_mut().unwrap().remove("reception_number");

    let body = app
        .expect_json(
            Method::POST,
            &format!("/customers/{customer_id}/receptions"),
            &payload,
            StatusCode::BAD_REQUEST,
        )
        .await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("بدنه درخواست معتبر نیست"));
}

#[tokio::test]
async fn create_reception_requires_authentication() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer("کریمی").await;

    let response = app
        .request_without_auth(
            Method::POST,
            &format!("/customers/{customer_id}/receptions"),
            &reception_payload(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn append_orders_copies_car_name_from_prior_orders() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer("رضایی").await;

    let body = app
        .expect_json(
            Method::POST,
            &format!("/customers/{customer_id}/receptions"),
            &reception_payload(),
            StatusCode::OK,
        )
        .await;
    let reception_id = body["reception_id"].as_i64().unwrap();

    let append = json!({
        "orders": [
            {
                "order_number": "ORD-3",
                "piece_name": "فیلتر روغن",
                "part_id": "P-90",
                "number_of_pieces": 1,
                "order_channel": "شرکتی"
            }
        ]
    });

    let body = app
        .expect_json(
            Method::POST,
            &format!("/receptions/{reception_id}/orders"),
            &append,
            StatusCode::OK,
        )
        .await;
    assert_eq!(body["message"], "قطعات جدید با موفقیت اضافه شدند.");
    assert_eq!(body["order_count"], 1);

    let appended = order::Entity::find()
        .filter(order::Column::OrderNumber.eq("ORD-3"))
        .one(&*app.db)
        .await
        .expect("query failed")
        .expect("appended order missing");
    assert_eq!(appended.car_name.as_deref(), Some("پژو 206"));
    assert_eq!(appended.status, "در انتظار تائید شرکت");
    assert_eq!(appended.reception_id, reception_id as i32);

    let audits = audit_log::Entity::find()
        .filter(audit_log::Column::Action.eq("افزودن سفارش به پذیرش"))
        .all(&*app.db)
        .await
        .expect("query failed");
    assert_eq!(audits.len(), 1);
    assert!(audits[0].message.contains("رضایی"));
}

#[tokio::test]
async fn append_to_unknown_reception_is_not_found() {
    let app = TestApp::new().await;

    let append = json!({
        "orders": [
            {
                "order_number": "ORD-9",
                "piece_name": "شمع",
                "number_of_pieces": 1,
                "order_channel": "بازار آزاد"
            }
        ]
    });

    let body = app
        .expect_json(
            Method::POST,
            "/receptions/999/orders",
            &append,
            StatusCode::NOT_FOUND,
        )
        .await;
    assert_eq!(body["message"], "پذیرش با این شناسه یافت نشد.");
}

#[tokio::test]
async fn append_without_prior_orders_rejects_missing_car_name() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer("کریمی").await;

    // A reception with no orders can only come from outside this API.
    let seeded = app
        .db
        .execute(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            "INSERT INTO receptions (customer_id, reception_number, reception_date, car_status, car_name)
             VALUES (?, 'R-200', '2024-08-02', 'در تعمیرگاه', 'پراید')",
            [customer_id.into()],
        ))
        .await
        .expect("failed to seed reception");
    let reception_id = seeded.last_insert_id() as i32;

    let append = json!({
        "orders": [
            {
                "order_number": "ORD-10",
                "piece_name": "شمع",
                "number_of_pieces": 1,
                "order_channel": "بازار آزاد"
            }
        ]
    });

    let body = app
        .expect_json(
            Method::POST,
            &format!("/receptions/{reception_id}/orders"),
            &append,
            StatusCode::BAD_REQUEST,
        )
        .await;
    assert_eq!(body["message"], "نام خودرو برای پذیرش مورد نظر یافت نشد.");
}
