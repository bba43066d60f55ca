use super::*;
use async_trait::async_trait;
use shared::protocol::{Catalog, CatalogProduct, RecommendedProduct};
use std::sync::Mutex as StdMutex;
use std::time::Duration;
use tokio::sync::Notify;

type CallResult<T> = Result<T, (u16, String)>;

fn to_backend_err((status, message): (u16, String)) -> BackendError {
    BackendError::status(status, message)
}

struct StubBackend {
    catalog: StdMutex<CallResult<Catalog>>,
    recommend: StdMutex<CallResult<RecommendationResponse>>,
    generate: StdMutex<CallResult<Vec<u8>>>,
    product_pitch: StdMutex<CallResult<Vec<u8>>>,
    recommend_payloads: StdMutex<Vec<PitchRequest>>,
    generate_payloads: StdMutex<Vec<PitchRequest>>,
    pitch_requests: StdMutex<Vec<ProductId>>,
    recommend_gate: StdMutex<Option<Arc<Notify>>>,
}

impl StubBackend {
    fn ok() -> Arc<Self> {
        let catalog = Catalog {
            products: vec![CatalogProduct {
                id: ProductId::from("ILL"),
                name: "ILL".into(),
            }],
            industries: vec!["Retail".into(), "Telecom".into()],
        };
        let recommendation = RecommendationResponse {
            recommended: vec![RecommendedProduct {
                id: Some(ProductId::from("ILL")),
                name: "ILL".into(),
                talking_points: vec!["fast".into(), "reliable".into()],
            }],
        };
        Arc::new(Self {
            catalog: StdMutex::new(Ok(catalog)),
            recommend: StdMutex::new(Ok(recommendation)),
            generate: StdMutex::new(Ok(b"%PDF combined".to_vec())),
            product_pitch: StdMutex::new(Ok(b"%PDF product".to_vec())),
            recommend_payloads: StdMutex::new(Vec::new()),
            generate_payloads: StdMutex::new(Vec::new()),
            pitch_requests: StdMutex::new(Vec::new()),
            recommend_gate: StdMutex::new(None),
        })
    }

    fn fail_catalog(self: &Arc<Self>, status: u16, message: &str) {
        *self.catalog.lock().expect("lock") = Err((status, message.to_string()));
    }

    fn fail_recommend(self: &Arc<Self>, status: u16, message: &str) {
        *self.recommend.lock().expect("lock") = Err((status, message.to_string()));
    }

    fn fail_generate(self: &Arc<Self>, status: u16, message: &str) {
        *self.generate.lock().expect("lock") = Err((status, message.to_string()));
    }

    fn fail_product_pitch(self: &Arc<Self>, status: u16, message: &str) {
        *self.product_pitch.lock().expect("lock") = Err((status, message.to_string()));
    }

    fn gate_recommend(self: &Arc<Self>) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.recommend_gate.lock().expect("lock") = Some(gate.clone());
        gate
    }

    fn recommend_payloads(&self) -> Vec<PitchRequest> {
        self.recommend_payloads.lock().expect("lock").clone()
    }

    fn generate_payloads(&self) -> Vec<PitchRequest> {
        self.generate_payloads.lock().expect("lock").clone()
    }

    fn pitch_requests(&self) -> Vec<ProductId> {
        self.pitch_requests.lock().expect("lock").clone()
    }
}

#[async_trait]
impl PitchBackend for StubBackend {
    async fn fetch_catalog(&self) -> Result<Catalog, BackendError> {
        self.catalog.lock().expect("lock").clone().map_err(to_backend_err)
    }

    async fn recommend(
        &self,
        payload: &PitchRequest,
    ) -> Result<RecommendationResponse, BackendError> {
        self.recommend_payloads
            .lock()
            .expect("lock")
            .push(payload.clone());
        let gate = self.recommend_gate.lock().expect("lock").clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.recommend.lock().expect("lock").clone().map_err(to_backend_err)
    }

    async fn generate(&self, payload: &PitchRequest) -> Result<Vec<u8>, BackendError> {
        self.generate_payloads
            .lock()
            .expect("lock")
            .push(payload.clone());
        self.generate.lock().expect("lock").clone().map_err(to_backend_err)
    }

    async fn product_pitch(&self, product_id: &ProductId) -> Result<Vec<u8>, BackendError> {
        self.pitch_requests
            .lock()
            .expect("lock")
            .push(product_id.clone());
        self.product_pitch
            .lock()
            .expect("lock")
            .clone()
            .map_err(to_backend_err)
    }
}

#[derive(Default)]
struct MemorySink {
    saves: StdMutex<Vec<(String, Vec<u8>)>>,
    fail: StdMutex<bool>,
}

impl MemorySink {
    fn saved(&self) -> Vec<(String, Vec<u8>)> {
        self.saves.lock().expect("lock").clone()
    }

    fn fail_next(&self) {
        *self.fail.lock().expect("lock") = true;
    }
}

impl DocumentSink for MemorySink {
    fn save(&self, file_name: &str, bytes: &[u8]) -> anyhow::Result<PathBuf> {
        if *self.fail.lock().expect("lock") {
            anyhow::bail!("disk full");
        }
        self.saves
            .lock()
            .expect("lock")
            .push((file_name.to_string(), bytes.to_vec()));
        Ok(PathBuf::from(file_name))
    }
}

async fn fill_valid_form(workflow: &PitchWorkflow) {
    workflow.set_field(FieldId::ClientName, "Acme").await;
    workflow.set_field(FieldId::CompanyName, "Acme Corp").await;
    workflow.set_field(FieldId::NamName, "R. Iyer").await;
    workflow.set_field(FieldId::NamCircle, "Mumbai").await;
    workflow.set_field(FieldId::Industry, "Telecom").await;
    workflow.set_field(FieldId::BudgetBand, "Medium").await;
}

async fn ready_workflow() -> (Arc<PitchWorkflow>, Arc<StubBackend>, Arc<MemorySink>) {
    let backend = StubBackend::ok();
    let sink = Arc::new(MemorySink::default());
    let workflow = PitchWorkflow::new(backend.clone(), sink.clone());
    workflow.activate().await.expect("activate");
    (workflow, backend, sink)
}

async fn wait_for_phase(workflow: &PitchWorkflow, phase: WorkflowPhase) {
    for _ in 0..200 {
        if workflow.phase().await == phase {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("timed out waiting for phase {phase:?}");
}

fn drain(events: &mut tokio::sync::broadcast::Receiver<WorkflowEvent>) -> Vec<WorkflowEvent> {
    let mut collected = Vec::new();
    while let Ok(event) = events.try_recv() {
        collected.push(event);
    }
    collected
}

#[tokio::test]
async fn catalog_load_failure_disables_the_workflow() {
    let backend = StubBackend::ok();
    backend.fail_catalog(503, "catalog store offline");
    let sink = Arc::new(MemorySink::default());
    let workflow = PitchWorkflow::new(backend.clone(), sink);

    let err = workflow.activate().await.expect_err("should fail");
    assert!(matches!(err, WorkflowError::CatalogLoad(_)));
    assert_eq!(workflow.phase().await, WorkflowPhase::CatalogLoadFailed);
    assert_eq!(
        workflow.shared_error().await.as_deref(),
        Some("catalog store offline")
    );

    fill_valid_form(&workflow).await;
    let err = workflow.submit().await.expect_err("submit must be refused");
    assert!(matches!(err, WorkflowError::NotReady));
    assert!(backend.recommend_payloads().is_empty());
}

#[tokio::test]
async fn manual_reload_recovers_from_catalog_failure() {
    let backend = StubBackend::ok();
    backend.fail_catalog(500, "boom");
    let sink = Arc::new(MemorySink::default());
    let workflow = PitchWorkflow::new(backend.clone(), sink);
    workflow.activate().await.expect_err("first load fails");

    *backend.catalog.lock().expect("lock") = Ok(Catalog {
        products: vec![],
        industries: vec!["Retail".into()],
    });
    workflow.activate().await.expect("reload");
    assert_eq!(workflow.phase().await, WorkflowPhase::Ready);
    assert_eq!(workflow.shared_error().await, None);
    assert_eq!(
        workflow.industry_options().await,
        vec![INDUSTRY_PLACEHOLDER.to_string(), "Retail".to_string()]
    );
}

#[tokio::test]
async fn submit_runs_recommend_then_generate_with_the_same_payload() {
    let (workflow, backend, sink) = ready_workflow().await;
    fill_valid_form(&workflow).await;
    workflow.set_field(FieldId::Size, "250").await;
    workflow.mark_product_sold(ProductId::from("MPLS")).await;
    let mut events = workflow.subscribe_events();

    let recommendation = workflow.submit().await.expect("submit");

    assert_eq!(recommendation.recommended.len(), 1);
    assert_eq!(recommendation.recommended[0].name, "ILL");
    assert_eq!(
        recommendation.recommended[0].talking_points,
        vec!["fast", "reliable"]
    );

    let recommend_payloads = backend.recommend_payloads();
    let generate_payloads = backend.generate_payloads();
    assert_eq!(recommend_payloads.len(), 1);
    assert_eq!(generate_payloads.len(), 1);
    assert_eq!(recommend_payloads[0], generate_payloads[0]);
    assert_eq!(recommend_payloads[0].industry, "Telecom");
    assert_eq!(recommend_payloads[0].budget_band, BudgetBand::Medium);
    assert_eq!(recommend_payloads[0].size, Some(250));
    assert_eq!(recommend_payloads[0].bandwidth_mbps, FIXED_BANDWIDTH_MBPS);
    assert_eq!(
        recommend_payloads[0].products_already_sold,
        vec![ProductId::from("MPLS")]
    );

    assert_eq!(
        sink.saved(),
        vec![(FINAL_DECK_FILE_NAME.to_string(), b"%PDF combined".to_vec())]
    );
    assert_eq!(workflow.phase().await, WorkflowPhase::Ready);
    assert_eq!(workflow.shared_error().await, None);

    let seen = drain(&mut events);
    assert!(seen.iter().any(|event| matches!(
        event,
        WorkflowEvent::DeckSaved { file_name } if file_name == FINAL_DECK_FILE_NAME
    )));
    assert!(seen
        .iter()
        .any(|event| matches!(event, WorkflowEvent::RecommendationReady(_))));
}

#[tokio::test]
async fn recommend_failure_surfaces_backend_text_and_skips_generation() {
    let (workflow, backend, sink) = ready_workflow().await;
    backend.fail_recommend(500, "industry unsupported");
    fill_valid_form(&workflow).await;

    let err = workflow.submit().await.expect_err("should fail");
    assert!(matches!(err, WorkflowError::Recommendation(_)));
    assert_eq!(
        workflow.shared_error().await.as_deref(),
        Some("industry unsupported")
    );
    assert!(backend.generate_payloads().is_empty());
    assert!(sink.saved().is_empty());
    assert_eq!(workflow.phase().await, WorkflowPhase::Ready);

    // Still resubmittable without touching the form again.
    *backend.recommend.lock().expect("lock") = Ok(RecommendationResponse::default());
    workflow.submit().await.expect("resubmit");
    assert_eq!(workflow.shared_error().await, None);
}

#[tokio::test]
async fn generation_failure_keeps_the_rendered_recommendation() {
    let (workflow, backend, _sink) = ready_workflow().await;
    backend.fail_generate(500, "pdf merge failed");
    fill_valid_form(&workflow).await;

    let err = workflow.submit().await.expect_err("generation fails");
    assert!(matches!(err, WorkflowError::Generation(_)));
    assert_eq!(
        workflow.shared_error().await.as_deref(),
        Some("pdf merge failed")
    );
    let kept = workflow.recommendation().await.expect("recommendation kept");
    assert_eq!(kept.recommended[0].name, "ILL");
    assert_eq!(workflow.phase().await, WorkflowPhase::Ready);
}

#[tokio::test]
async fn deck_save_failure_is_surfaced_but_recommendation_survives() {
    let (workflow, _backend, sink) = ready_workflow().await;
    fill_valid_form(&workflow).await;
    sink.fail_next();

    let err = workflow.submit().await.expect_err("save fails");
    assert!(matches!(err, WorkflowError::SaveDocument { .. }));
    assert!(workflow.shared_error().await.is_some());
    assert!(workflow.recommendation().await.is_some());
    assert_eq!(workflow.phase().await, WorkflowPhase::Ready);
}

#[tokio::test]
async fn invalid_form_blocks_submission_locally() {
    let (workflow, backend, _sink) = ready_workflow().await;
    workflow.set_field(FieldId::ClientName, "Acme").await;

    let err = workflow.submit().await.expect_err("invalid form");
    match err {
        WorkflowError::FormInvalid { first_invalid } => {
            assert_eq!(first_invalid, Some(FieldId::CompanyName));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(backend.recommend_payloads().is_empty());
    // Local validation never reaches the shared error slot.
    assert_eq!(workflow.shared_error().await, None);
}

#[tokio::test]
async fn budget_band_outside_the_enumeration_is_rejected_at_payload_build() {
    let (workflow, backend, _sink) = ready_workflow().await;
    fill_valid_form(&workflow).await;
    workflow.set_field(FieldId::BudgetBand, "Annual").await;

    let err = workflow.submit().await.expect_err("bad band");
    assert!(matches!(
        err,
        WorkflowError::InvalidField {
            field: FieldId::BudgetBand,
            ..
        }
    ));
    assert!(backend.recommend_payloads().is_empty());
}

#[tokio::test]
async fn in_flight_submission_is_guarded_and_payload_is_a_snapshot() {
    let (workflow, backend, _sink) = ready_workflow().await;
    fill_valid_form(&workflow).await;
    workflow.mark_product_sold(ProductId::from("MPLS")).await;
    let gate = backend.gate_recommend();

    let inflight = {
        let workflow = workflow.clone();
        tokio::spawn(async move { workflow.submit().await })
    };
    wait_for_phase(&workflow, WorkflowPhase::Submitting).await;

    // Double-submission guard while the first request is outstanding.
    let err = workflow.submit().await.expect_err("must be guarded");
    assert!(matches!(err, WorkflowError::Busy(WorkflowPhase::Submitting)));

    // Sold-product edits during flight must not change the in-flight payload.
    workflow.mark_product_sold(ProductId::from("SIP")).await;
    gate.notify_one();
    inflight.await.expect("join").expect("submit");

    let payloads = backend.recommend_payloads();
    assert_eq!(payloads.len(), 1);
    assert_eq!(
        payloads[0].products_already_sold,
        vec![ProductId::from("MPLS")]
    );
    assert_eq!(
        workflow.sold_products().await,
        vec![ProductId::from("MPLS"), ProductId::from("SIP")]
    );
}

#[tokio::test]
async fn catalog_reload_never_mutates_the_sold_selection() {
    let (workflow, _backend, _sink) = ready_workflow().await;
    workflow.mark_product_sold(ProductId::from("WIFI")).await;
    workflow.mark_product_sold(ProductId::from("CCTV")).await;

    workflow.activate().await.expect("reload");
    assert_eq!(
        workflow.sold_products().await,
        vec![ProductId::from("WIFI"), ProductId::from("CCTV")]
    );
}

#[tokio::test]
async fn product_download_failure_never_touches_the_shared_error_slot() {
    let (workflow, backend, sink) = ready_workflow().await;
    backend.fail_product_pitch(404, "no deck for product");
    let mut events = workflow.subscribe_events();

    // Id not present in the loaded catalog: display name falls back to the
    // humanized id, and the request still targets the raw id.
    let err = workflow
        .download_product_pitch(ProductId::from("DARK_FIBER"))
        .await
        .expect_err("download fails");
    match err {
        WorkflowError::ProductDownload { product_id, reason } => {
            assert_eq!(product_id, ProductId::from("DARK_FIBER"));
            assert_eq!(reason, "no deck for product");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(backend.pitch_requests(), vec![ProductId::from("DARK_FIBER")]);
    assert_eq!(workflow.shared_error().await, None);
    assert!(sink.saved().is_empty());

    let seen = drain(&mut events);
    assert!(seen.iter().any(|event| matches!(
        event,
        WorkflowEvent::ProductDownloadFailed { product_id, .. }
            if *product_id == ProductId::from("DARK_FIBER")
    )));
    assert!(!seen
        .iter()
        .any(|event| matches!(event, WorkflowEvent::Error(_))));
}

#[tokio::test]
async fn product_download_saves_under_the_display_name() {
    let (workflow, _backend, sink) = ready_workflow().await;

    // "ILL" is in the stub catalog; "BULK_FTTH" is not and gets humanized.
    workflow
        .download_product_pitch(ProductId::from("ILL"))
        .await
        .expect("download");
    workflow
        .download_product_pitch(ProductId::from("BULK_FTTH"))
        .await
        .expect("download");

    let names: Vec<String> = sink.saved().into_iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["ILL.pdf".to_string(), "BULK FTTH.pdf".to_string()]);
}

#[tokio::test]
async fn product_download_requires_a_first_successful_catalog_load() {
    let backend = StubBackend::ok();
    let sink = Arc::new(MemorySink::default());
    let workflow = PitchWorkflow::new(backend, sink);

    let err = workflow
        .download_product_pitch(ProductId::from("ILL"))
        .await
        .expect_err("not ready");
    assert!(matches!(err, WorkflowError::NotReady));
}
