mod common;

use catalog_admin::api::{ApiError, SubmitOutcome, UpdateReply};
use catalog_admin::image::ImageLoadState;
use catalog_admin::lifecycle::{RequestState, Settled};
use catalog_admin::model::{
    Category, FieldError, Notification, PendingFile, ResourceId, ResourceKind, Slider, Status,
};
use catalog_admin::notify::{Toast, ToastLevel};
use catalog_admin::routes::Route;
use catalog_admin::{ConsoleError, EditPhase, ResourceEditController};
use common::{Call, Gate, Harness, RecordingCatalog};
use serde_json::json;
use std::sync::Arc;

const PLACEHOLDER: &str = "https://kmrlive.in/storage/app/public/no_image.jpg";

fn snacks() -> serde_json::Value {
    json!({
        "category": {
            "id": 42,
            "category_name": "Snacks",
            "category_status": "Active",
            "categories_images": "snacks.jpg"
        }
    })
}

async fn ready_category(h: &Harness) -> ResourceEditController<Category> {
    h.catalog.push_record(Ok(snacks())).await;
    let edit = ResourceEditController::<Category>::new(h.ctx.clone(), h.token(42));
    edit.mount().await;
    assert_eq!(edit.phase(), EditPhase::Ready);
    edit
}

#[tokio::test]
async fn fetch_populates_form() {
    let h = Harness::new(RecordingCatalog::new());
    let edit = ready_category(&h).await;

    assert_eq!(edit.id(), ResourceId::new(42));
    assert_eq!(
        h.catalog.calls().await,
        vec![Call::Record(ResourceKind::Category, ResourceId::new(42).unwrap())]
    );
    let form = edit.form().unwrap();
    assert_eq!(form.category_name, "Snacks");
    assert_eq!(form.category_status, Status::Active);
    assert_eq!(form.categories_images.as_deref(), Some("snacks.jpg"));

    assert!(!edit.loading_data());
    assert!(edit.submit_enabled());
    assert_eq!(edit.submit_label(), "Update");
    assert_eq!(edit.fetch_state(), RequestState::Settled(Settled::Success));

    // Category images are not cache-busted.
    let image = edit.image().unwrap();
    assert_eq!(
        image.display_url(),
        "https://kmrlive.in/storage/app/public/categories_images/snacks.jpg"
    );
    assert_eq!(image.state(), ImageLoadState::Pending);
    edit.image_loaded();
    assert_eq!(edit.image().unwrap().state(), ImageLoadState::Resolved);
}

#[tokio::test]
async fn percent_encoded_route_token_is_accepted() {
    let h = Harness::new(RecordingCatalog::new());
    h.catalog.push_record(Ok(snacks())).await;
    let token = urlencoding::encode(&h.token(42)).into_owned();
    let edit = ResourceEditController::<Category>::new(h.ctx.clone(), token);
    edit.mount().await;
    assert_eq!(edit.id(), ResourceId::new(42));
}

#[tokio::test]
async fn submit_without_file_omits_image_and_navigates() {
    let h = Harness::new(RecordingCatalog::new());
    let edit = ready_category(&h).await;
    h.catalog
        .push_update(Ok(UpdateReply {
            code: 200,
            msg: Some("Data updated successfully".into()),
        }))
        .await;

    let outcome = edit.submit().await;
    assert_eq!(
        outcome,
        Some(SubmitOutcome::Success("Data updated successfully".into()))
    );

    let forms = h.catalog.update_forms().await;
    assert_eq!(forms.len(), 1);
    assert_eq!(forms[0].text("category_name"), Some("Snacks"));
    assert_eq!(forms[0].text("category_status"), Some("Active"));
    assert!(!forms[0].contains("categories_images"));

    assert_eq!(edit.phase(), EditPhase::Navigated);
    assert_eq!(h.navigator.routes(), vec![Route::List(ResourceKind::Category)]);
    assert_eq!(
        h.toaster.toasts(),
        vec![Toast::success("Data updated successfully")]
    );
    assert!(!edit.lifecycle().is_active());
}

#[tokio::test]
async fn success_without_message_uses_default() {
    let h = Harness::new(RecordingCatalog::new());
    let edit = ready_category(&h).await;
    h.catalog
        .push_update(Ok(UpdateReply { code: 200, msg: None }))
        .await;
    edit.submit().await;
    assert_eq!(
        h.toaster.toasts(),
        vec![Toast::success("Data updated successfully")]
    );
}

#[tokio::test]
async fn conflict_keeps_form_and_reenables_submit() {
    let h = Harness::new(RecordingCatalog::new());
    let edit = ready_category(&h).await;
    edit.set_field("category_status", "Inactive").unwrap();
    let before = edit.form();
    h.catalog
        .push_update(Ok(UpdateReply {
            code: 409,
            msg: Some("Duplicate Entry".into()),
        }))
        .await;

    let outcome = edit.submit().await;
    assert_eq!(
        outcome,
        Some(SubmitOutcome::BusinessConflict("Duplicate Entry".into()))
    );
    assert_eq!(edit.phase(), EditPhase::Ready);
    assert_eq!(edit.form(), before);
    assert!(edit.submit_enabled());
    assert_eq!(edit.submit_label(), "Update");
    assert!(h.navigator.routes().is_empty());
    assert_eq!(h.toaster.toasts(), vec![Toast::error("Duplicate Entry")]);
    assert!(matches!(edit.error(), Some(ConsoleError::SubmitConflict { .. })));
}

#[tokio::test]
async fn conflict_without_message_defaults_to_duplicate_entry() {
    let h = Harness::new(RecordingCatalog::new());
    let edit = ready_category(&h).await;
    h.catalog
        .push_update(Ok(UpdateReply { code: 400, msg: None }))
        .await;
    edit.submit().await;
    assert_eq!(h.toaster.toasts(), vec![Toast::error("Duplicate Entry")]);
}

#[tokio::test]
async fn transport_failure_shows_generic_message() {
    let h = Harness::new(RecordingCatalog::new());
    let edit = ready_category(&h).await;
    h.catalog
        .push_update(Err(ApiError::Status {
            status: 502,
            body: "<html>bad gateway</html>".into(),
        }))
        .await;

    let outcome = edit.submit().await;
    assert!(matches!(outcome, Some(SubmitOutcome::TransportFailure(_))));
    assert_eq!(edit.phase(), EditPhase::Ready);
    assert_eq!(h.toaster.toasts(), vec![Toast::error("Failed to update category.")]);
    assert_eq!(edit.submit_state(), RequestState::Settled(Settled::Failure));
}

#[tokio::test]
async fn resubmitting_sends_identical_bodies() {
    let h = Harness::new(RecordingCatalog::new());
    let edit = ready_category(&h).await;
    for _ in 0..2 {
        h.catalog
            .push_update(Ok(UpdateReply {
                code: 409,
                msg: Some("Duplicate Entry".into()),
            }))
            .await;
        edit.submit().await;
    }
    let forms = h.catalog.update_forms().await;
    assert_eq!(forms.len(), 2);
    assert_eq!(forms[0], forms[1]);
}

#[tokio::test]
async fn selected_file_is_sent_and_replaced() {
    let h = Harness::new(RecordingCatalog::new());
    let edit = ready_category(&h).await;
    edit.select_file(PendingFile::new("first.png", vec![1])).unwrap();
    edit.select_file(PendingFile::new("second.jpg", vec![2, 3])).unwrap();
    edit.submit().await;

    let forms = h.catalog.update_forms().await;
    let file = forms[0].file("categories_images").unwrap();
    assert_eq!(file.file_name, "second.jpg");
    assert_eq!(file.content_type, "image/jpeg");
    assert_eq!(
        forms[0]
            .parts()
            .iter()
            .filter(|p| p.name() == "categories_images")
            .count(),
        1
    );
}

#[tokio::test]
async fn submit_is_disabled_while_in_flight() {
    let gate = Gate::default();
    let gated = Harness::new(RecordingCatalog::gated(gate.clone()));
    gated.catalog.push_record(Ok(snacks())).await;
    let edit_gated = Arc::new(ResourceEditController::<Category>::new(
        gated.ctx.clone(),
        gated.token(42),
    ));
    let mount = tokio::spawn({
        let e = edit_gated.clone();
        async move { e.mount().await }
    });
    gate.entered.notified().await;
    assert!(edit_gated.loading_data());
    assert!(edit_gated.form().is_none());
    gate.release.notify_one();
    mount.await.unwrap();
    assert_eq!(edit_gated.phase(), EditPhase::Ready);

    let submit = tokio::spawn({
        let e = edit_gated.clone();
        async move { e.submit().await }
    });
    gate.entered.notified().await;
    assert_eq!(edit_gated.phase(), EditPhase::Submitting);
    assert!(!edit_gated.submit_enabled());
    assert_eq!(edit_gated.submit_label(), "Updating...");
    // A second trigger while in flight does nothing.
    assert_eq!(edit_gated.submit().await, None);

    gate.release.notify_one();
    assert!(submit.await.unwrap().unwrap().is_success());
    assert_eq!(gated.catalog.update_forms().await.len(), 1);
}

#[tokio::test]
async fn malformed_token_never_fetches() {
    let h = Harness::new(RecordingCatalog::new());
    for token in ["", "garbage", "%FF%FE", "AAAAAAAAAAAAAAAAAA"] {
        let edit = ResourceEditController::<Notification>::new(h.ctx.clone(), token);
        edit.mount().await;
        assert_eq!(edit.phase(), EditPhase::Malformed);
        assert!(edit.form().is_none());
        assert!(!edit.submit_enabled());
        assert!(matches!(
            edit.error(),
            Some(ConsoleError::MalformedIdentifier { .. })
        ));
    }
    assert!(h.catalog.calls().await.is_empty());
    let toasts = h.toaster.toasts();
    assert_eq!(toasts.len(), 4);
    assert!(toasts
        .iter()
        .all(|t| t.level == ToastLevel::Error && t.message == "Invalid notification link."));
}

#[tokio::test]
async fn fetch_failure_is_not_editable() {
    let h = Harness::new(RecordingCatalog::new());
    h.catalog
        .push_record(Err(ApiError::Transport("connection reset".into())))
        .await;
    let edit = ResourceEditController::<Category>::new(h.ctx.clone(), h.token(7));
    edit.mount().await;

    assert_eq!(edit.phase(), EditPhase::Unavailable);
    assert!(edit.form().is_none());
    assert!(!edit.loading_data());
    assert_eq!(
        edit.set_field("category_status", "Inactive"),
        Err(FieldError::NotReady)
    );
    assert_eq!(edit.submit().await, None);
    assert_eq!(
        h.toaster.toasts(),
        vec![Toast::error("Failed to fetch category data.")]
    );
}

#[tokio::test]
async fn name_policy_follows_kind() {
    let h = Harness::new(RecordingCatalog::new());
    let cat = ready_category(&h).await;
    assert!(!cat.name_editable());
    assert_eq!(
        cat.set_field("category_name", "Chips"),
        Err(FieldError::ReadOnly("category_name"))
    );

    h.catalog
        .push_record(Ok(json!({
            "notification": {
                "notification_heading": "Sale",
                "notification_description": "Half off",
                "notification_status": "Active",
                "notification_image": null
            }
        })))
        .await;
    let notif = ResourceEditController::<Notification>::new(h.ctx.clone(), h.token(3));
    notif.mount().await;
    assert!(notif.name_editable());
    notif.set_field("notification_heading", "Big sale").unwrap();
    assert_eq!(notif.form().unwrap().notification_heading, "Big sale");

    // Null image resolves straight to the placeholder.
    let image = notif.image().unwrap();
    assert_eq!(image.display_url(), PLACEHOLDER);
    assert_eq!(image.state(), ImageLoadState::Resolved);
}

#[tokio::test]
async fn broken_image_falls_back_to_placeholder() {
    let h = Harness::new(RecordingCatalog::new());
    h.catalog
        .push_record(Ok(json!({
            "slider": { "slider_url": "https://promo", "slider_status": "Active", "slider_images": "promo.png" }
        })))
        .await;
    let edit = ResourceEditController::<Slider>::new(h.ctx.clone(), h.token(11));
    edit.mount().await;
    let image = edit.image().unwrap();
    assert!(image.display_url().contains("slider_images/promo.png?t="));

    edit.image_failed();
    let image = edit.image().unwrap();
    assert_eq!(image.state(), ImageLoadState::Broken);
    assert_eq!(image.display_url(), PLACEHOLDER);
}

#[tokio::test]
async fn teardown_during_fetch_drops_result() {
    let gate = Gate::default();
    let h = Harness::new(RecordingCatalog::gated(gate.clone()));
    h.catalog.push_record(Ok(snacks())).await;
    let edit = Arc::new(ResourceEditController::<Category>::new(
        h.ctx.clone(),
        h.token(42),
    ));
    let mount = tokio::spawn({
        let e = edit.clone();
        async move { e.mount().await }
    });
    gate.entered.notified().await;
    edit.lifecycle().teardown();
    gate.release.notify_one();
    mount.await.unwrap();

    assert!(edit.form().is_none());
    assert_eq!(edit.phase(), EditPhase::Detached);
    assert_eq!(edit.fetch_state(), RequestState::Abandoned);
    assert!(!edit.loading_data());
    assert!(!edit.submit_enabled());
    assert!(h.toaster.toasts().is_empty());

    // A late mount call does not restart the fetch.
    edit.mount().await;
    assert_eq!(h.catalog.calls().await.len(), 1);
}

#[tokio::test]
async fn teardown_during_submit_drops_reply() {
    let gate = Gate::default();
    let h = Harness::new(RecordingCatalog::gated(gate.clone()));
    h.catalog.push_record(Ok(snacks())).await;
    let edit = Arc::new(ResourceEditController::<Category>::new(
        h.ctx.clone(),
        h.token(42),
    ));
    let mount = tokio::spawn({
        let e = edit.clone();
        async move { e.mount().await }
    });
    gate.entered.notified().await;
    gate.release.notify_one();
    mount.await.unwrap();
    assert_eq!(edit.phase(), EditPhase::Ready);

    let submit = tokio::spawn({
        let e = edit.clone();
        async move { e.submit().await }
    });
    gate.entered.notified().await;
    assert_eq!(edit.submit_label(), "Updating...");
    edit.lifecycle().teardown();
    gate.release.notify_one();

    assert_eq!(submit.await.unwrap(), None);
    assert_eq!(edit.phase(), EditPhase::Detached);
    assert_eq!(edit.submit_state(), RequestState::Abandoned);
    assert_eq!(edit.submit_label(), "Update");
    assert!(!edit.submit_enabled());
    assert!(h.toaster.toasts().is_empty());
    assert!(h.navigator.routes().is_empty());
}

#[tokio::test]
async fn cancel_returns_to_list() {
    let h = Harness::new(RecordingCatalog::new());
    let edit = ready_category(&h).await;
    edit.cancel();
    assert_eq!(edit.phase(), EditPhase::Navigated);
    assert!(edit.form().is_none());
    assert_eq!(h.navigator.routes(), vec![Route::List(ResourceKind::Category)]);
    assert!(!edit.lifecycle().is_active());
}
