//! Workflow orchestration for the pitch recommendation client.
//!
//! [`PitchWorkflow`] owns all mutable client state (catalog cache, sold
//! selection, form state, last recommendation, shared error slot) and funnels
//! every mutation through explicit named transitions, so an event/UI layer on
//! top stays free of business rules.

use std::path::PathBuf;
use std::sync::Arc;

use backend_api::PitchBackend;
use shared::{
    domain::{BudgetBand, ProductId},
    error::BackendError,
    protocol::{PitchRequest, RecommendationResponse, FINAL_DECK_FILE_NAME, FIXED_BANDWIDTH_MBPS},
};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

pub mod catalog;
pub mod selection;
pub mod sink;
pub mod validation;

pub use catalog::{filter_circles, CatalogCache, ALLOWED_PRODUCT_IDS, CIRCLES, INDUSTRY_PLACEHOLDER};
pub use selection::SoldProducts;
pub use sink::{DocumentSink, DownloadsDirSink};
pub use validation::{FieldId, PitchForm, ValidationOutcome};

/// States of the main workflow. `SubmitFailed` is passed through on the way
/// back to `Ready`; the success path also ends in `Ready` so the operator can
/// submit again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowPhase {
    Idle,
    CatalogLoading,
    CatalogLoadFailed,
    Ready,
    Submitting,
    SubmitFailed,
    RecommendationShown,
    Downloading,
}

#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    PhaseChanged(WorkflowPhase),
    CatalogLoaded,
    SoldProductsChanged(Vec<ProductId>),
    ValidationChanged(ValidationOutcome),
    RecommendationReady(RecommendationResponse),
    /// Transient confirmation notice after a successful deck save.
    DeckSaved { file_name: String },
    /// The shared error slot was overwritten with this text.
    Error(String),
    /// Scoped to one per-product download button; never touches the shared
    /// error slot.
    ProductDownloadFailed { product_id: ProductId, reason: String },
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("{0}")]
    CatalogLoad(BackendError),
    #[error("{0}")]
    Recommendation(BackendError),
    #[error("{0}")]
    Generation(BackendError),
    #[error("could not save {file_name}: {reason}")]
    SaveDocument { file_name: String, reason: String },
    #[error("pitch download for {product_id} failed: {reason}")]
    ProductDownload {
        product_id: ProductId,
        reason: String,
    },
    #[error("catalog is not loaded")]
    NotReady,
    #[error("workflow is busy ({0:?})")]
    Busy(WorkflowPhase),
    #[error("required fields are incomplete")]
    FormInvalid { first_invalid: Option<FieldId> },
    #[error("{field} has invalid value {value:?}")]
    InvalidField { field: FieldId, value: String },
}

struct WorkflowState {
    phase: WorkflowPhase,
    /// Set once the first catalog load succeeds; gates per-product downloads.
    ready_reached: bool,
    catalog: CatalogCache,
    sold: SoldProducts,
    form: PitchForm,
    recommendation: Option<RecommendationResponse>,
    /// Single user-visible error slot for the main workflow. Every failure
    /// overwrites it; a new submission clears it.
    error_slot: Option<String>,
}

pub struct PitchWorkflow {
    backend: Arc<dyn PitchBackend>,
    sink: Arc<dyn DocumentSink>,
    inner: Mutex<WorkflowState>,
    events: broadcast::Sender<WorkflowEvent>,
}

impl PitchWorkflow {
    pub fn new(backend: Arc<dyn PitchBackend>, sink: Arc<dyn DocumentSink>) -> Arc<Self> {
        let (events, _) = broadcast::channel(1024);
        Arc::new(Self {
            backend,
            sink,
            inner: Mutex::new(WorkflowState {
                phase: WorkflowPhase::Idle,
                ready_reached: false,
                catalog: CatalogCache::new(),
                sold: SoldProducts::new(),
                form: PitchForm::new(),
                recommendation: None,
                error_slot: None,
            }),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.events.subscribe()
    }

    pub async fn phase(&self) -> WorkflowPhase {
        self.inner.lock().await.phase
    }

    pub async fn shared_error(&self) -> Option<String> {
        self.inner.lock().await.error_slot.clone()
    }

    pub async fn recommendation(&self) -> Option<RecommendationResponse> {
        self.inner.lock().await.recommendation.clone()
    }

    /// Loads (or reloads) the catalog. Allowed from `Idle`, from
    /// `CatalogLoadFailed` (manual retry) and from `Ready` (full replace; the
    /// sold selection is untouched). No automatic retry on failure.
    pub async fn activate(&self) -> Result<(), WorkflowError> {
        {
            let mut guard = self.inner.lock().await;
            match guard.phase {
                WorkflowPhase::Idle | WorkflowPhase::CatalogLoadFailed | WorkflowPhase::Ready => {}
                other => return Err(WorkflowError::Busy(other)),
            }
            self.set_phase(&mut guard, WorkflowPhase::CatalogLoading);
        }

        match self.backend.fetch_catalog().await {
            Ok(fetched) => {
                let mut guard = self.inner.lock().await;
                info!(
                    products = fetched.products.len(),
                    industries = fetched.industries.len(),
                    "catalog loaded"
                );
                guard.catalog.replace(fetched);
                guard.ready_reached = true;
                guard.error_slot = None;
                let _ = self.events.send(WorkflowEvent::CatalogLoaded);
                self.set_phase(&mut guard, WorkflowPhase::Ready);
                Ok(())
            }
            Err(err) => {
                let message = err.surface_message();
                warn!(%message, "catalog load failed");
                let mut guard = self.inner.lock().await;
                self.set_phase(&mut guard, WorkflowPhase::CatalogLoadFailed);
                self.surface_error(&mut guard, message);
                Err(WorkflowError::CatalogLoad(err))
            }
        }
    }

    /// Records an operator edit: stores the value, marks the field touched
    /// and re-derives validity. Not a phase transition.
    pub async fn set_field(&self, field: FieldId, value: impl Into<String>) -> ValidationOutcome {
        let mut guard = self.inner.lock().await;
        guard.form.set_value(field, value);
        guard.form.mark_touched(field);
        let outcome = guard.form.recompute();
        let _ = self.events.send(WorkflowEvent::ValidationChanged(outcome));
        outcome
    }

    /// Current validity, recomputed without side effects.
    pub async fn validation(&self) -> ValidationOutcome {
        self.inner.lock().await.form.recompute()
    }

    pub async fn field_shows_error(&self, field: FieldId) -> bool {
        self.inner.lock().await.form.shows_error(field)
    }

    pub async fn mark_product_sold(&self, id: ProductId) -> bool {
        let mut guard = self.inner.lock().await;
        let changed = guard.sold.add(id);
        if changed {
            let _ = self
                .events
                .send(WorkflowEvent::SoldProductsChanged(guard.sold.to_vec()));
        }
        changed
    }

    pub async fn unmark_product_sold(&self, id: &ProductId) -> bool {
        let mut guard = self.inner.lock().await;
        let changed = guard.sold.remove(id);
        if changed {
            let _ = self
                .events
                .send(WorkflowEvent::SoldProductsChanged(guard.sold.to_vec()));
        }
        changed
    }

    pub async fn sold_products(&self) -> Vec<ProductId> {
        self.inner.lock().await.sold.to_vec()
    }

    pub async fn industry_options(&self) -> Vec<String> {
        self.inner.lock().await.catalog.industry_options()
    }

    pub async fn sold_picker_options(&self) -> Vec<(ProductId, String)> {
        self.inner.lock().await.catalog.sold_picker_options()
    }

    pub async fn display_name(&self, id: &ProductId) -> String {
        self.inner.lock().await.catalog.display_name(id)
    }

    /// Runs one submission: recommend, then immediately generate the combined
    /// deck for the same payload snapshot. Sold-product edits made while the
    /// submission is in flight do not affect the snapshot. Rejected while a
    /// previous submission is still in flight.
    pub async fn submit(&self) -> Result<RecommendationResponse, WorkflowError> {
        let payload = {
            let mut guard = self.inner.lock().await;
            match guard.phase {
                WorkflowPhase::Ready => {}
                WorkflowPhase::Idle
                | WorkflowPhase::CatalogLoading
                | WorkflowPhase::CatalogLoadFailed => return Err(WorkflowError::NotReady),
                other => return Err(WorkflowError::Busy(other)),
            }
            let outcome = guard.form.recompute();
            if !outcome.valid {
                return Err(WorkflowError::FormInvalid {
                    first_invalid: outcome.first_invalid,
                });
            }
            let payload = build_payload(&guard)?;
            guard.error_slot = None;
            self.set_phase(&mut guard, WorkflowPhase::Submitting);
            payload
        };

        info!(
            industry = %payload.industry,
            budget_band = %payload.budget_band,
            sold = payload.products_already_sold.len(),
            "requesting recommendation"
        );

        let recommendation = match self.backend.recommend(&payload).await {
            Ok(recommendation) => recommendation,
            Err(err) => {
                let message = err.surface_message();
                warn!(%message, "recommendation request failed");
                let mut guard = self.inner.lock().await;
                self.set_phase(&mut guard, WorkflowPhase::SubmitFailed);
                self.surface_error(&mut guard, message);
                self.set_phase(&mut guard, WorkflowPhase::Ready);
                return Err(WorkflowError::Recommendation(err));
            }
        };

        {
            let mut guard = self.inner.lock().await;
            guard.recommendation = Some(recommendation.clone());
            self.set_phase(&mut guard, WorkflowPhase::RecommendationShown);
            let _ = self
                .events
                .send(WorkflowEvent::RecommendationReady(recommendation.clone()));
            self.set_phase(&mut guard, WorkflowPhase::Downloading);
        }

        match self.backend.generate(&payload).await {
            Ok(bytes) => match self.sink.save(FINAL_DECK_FILE_NAME, &bytes) {
                Ok(path) => {
                    info!(path = %path.display(), "combined deck saved");
                    let mut guard = self.inner.lock().await;
                    let _ = self.events.send(WorkflowEvent::DeckSaved {
                        file_name: FINAL_DECK_FILE_NAME.to_string(),
                    });
                    self.set_phase(&mut guard, WorkflowPhase::Ready);
                    Ok(recommendation)
                }
                Err(err) => {
                    let reason = err.to_string();
                    warn!(%reason, "deck save failed");
                    let mut guard = self.inner.lock().await;
                    self.surface_error(&mut guard, reason.clone());
                    self.set_phase(&mut guard, WorkflowPhase::Ready);
                    Err(WorkflowError::SaveDocument {
                        file_name: FINAL_DECK_FILE_NAME.to_string(),
                        reason,
                    })
                }
            },
            Err(err) => {
                // The recommendation stays rendered; only the error slot is
                // updated.
                let message = err.surface_message();
                warn!(%message, "deck generation failed");
                let mut guard = self.inner.lock().await;
                self.surface_error(&mut guard, message);
                self.set_phase(&mut guard, WorkflowPhase::Ready);
                Err(WorkflowError::Generation(err))
            }
        }
    }

    /// Fetches and saves the standalone deck for one product. Independent of
    /// the main workflow: allowed any time after `Ready` was first reached,
    /// may overlap a submission and other downloads, and its failures never
    /// reach the shared error slot.
    pub async fn download_product_pitch(
        &self,
        product_id: ProductId,
    ) -> Result<PathBuf, WorkflowError> {
        let display_name = {
            let guard = self.inner.lock().await;
            if !guard.ready_reached {
                return Err(WorkflowError::NotReady);
            }
            guard.catalog.display_name(&product_id)
        };

        let file_name = format!("{display_name}.pdf");
        let bytes = match self.backend.product_pitch(&product_id).await {
            Ok(bytes) => bytes,
            Err(err) => {
                let reason = err.surface_message();
                warn!(%product_id, %reason, "product pitch download failed");
                let _ = self.events.send(WorkflowEvent::ProductDownloadFailed {
                    product_id: product_id.clone(),
                    reason: reason.clone(),
                });
                return Err(WorkflowError::ProductDownload { product_id, reason });
            }
        };

        match self.sink.save(&file_name, &bytes) {
            Ok(path) => {
                info!(%product_id, path = %path.display(), "product pitch saved");
                Ok(path)
            }
            Err(err) => {
                let reason = err.to_string();
                warn!(%product_id, %reason, "product pitch save failed");
                let _ = self.events.send(WorkflowEvent::ProductDownloadFailed {
                    product_id: product_id.clone(),
                    reason: reason.clone(),
                });
                Err(WorkflowError::ProductDownload { product_id, reason })
            }
        }
    }

    fn set_phase(&self, state: &mut WorkflowState, phase: WorkflowPhase) {
        state.phase = phase;
        let _ = self.events.send(WorkflowEvent::PhaseChanged(phase));
    }

    fn surface_error(&self, state: &mut WorkflowState, message: String) {
        state.error_slot = Some(message.clone());
        let _ = self.events.send(WorkflowEvent::Error(message));
    }
}

/// Assembles the request payload from current form values and the sold
/// selection. Only called once the form is valid; membership of the industry
/// and budget band in their fixed option sets is still enforced here.
fn build_payload(state: &WorkflowState) -> Result<PitchRequest, WorkflowError> {
    let industry = state.form.trimmed_value(FieldId::Industry).to_string();
    if !state.catalog.offers_industry(&industry) {
        return Err(WorkflowError::InvalidField {
            field: FieldId::Industry,
            value: industry,
        });
    }

    let band_raw = state.form.trimmed_value(FieldId::BudgetBand);
    let budget_band = band_raw
        .parse::<BudgetBand>()
        .map_err(|_| WorkflowError::InvalidField {
            field: FieldId::BudgetBand,
            value: band_raw.to_string(),
        })?;

    let size_raw = state.form.trimmed_value(FieldId::Size);
    let size = if size_raw.is_empty() {
        None
    } else {
        Some(
            size_raw
                .parse::<u64>()
                .map_err(|_| WorkflowError::InvalidField {
                    field: FieldId::Size,
                    value: size_raw.to_string(),
                })?,
        )
    };

    Ok(PitchRequest {
        client_name: state.form.trimmed_value(FieldId::ClientName).to_string(),
        company_name: state.form.trimmed_value(FieldId::CompanyName).to_string(),
        client_email: state.form.trimmed_value(FieldId::ClientEmail).to_string(),
        nam_name: state.form.trimmed_value(FieldId::NamName).to_string(),
        nam_circle: state.form.trimmed_value(FieldId::NamCircle).to_string(),
        industry,
        budget_band,
        size,
        products_already_sold: state.sold.to_vec(),
        bandwidth_mbps: FIXED_BANDWIDTH_MBPS,
    })
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
