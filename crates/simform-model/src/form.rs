//! Form sessions: a set of field dependencies edited and submitted together.

use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;
use simform_schema::SchemaStore;

use crate::dependency::Dependency;
use crate::error::{FormError, InvalidField, ModelError, Result};
use crate::resolve::{ResolvedGroup, distinct_models, resolve_group};
use crate::source::{SimulationInfo, SimulationSource};
use crate::store::ModelStore;

/// Aggregate state of a form session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    /// No field differs from the saved baseline.
    Clean,
    /// At least one field differs from the saved baseline.
    Dirty,
    /// A submit is in flight.
    Submitting,
}

/// Binds a view's dependencies into one submit/cancel unit.
///
/// Dirty and valid state are derived from the store on every call, never
/// cached.
#[derive(Debug)]
pub struct FormController<'a> {
    store: &'a ModelStore,
    schema: &'a SchemaStore,
    dependencies: Vec<Dependency>,
    submitting: AtomicBool,
}

impl<'a> FormController<'a> {
    pub fn new(store: &'a ModelStore, schema: &'a SchemaStore, dependencies: Vec<Dependency>) -> Self {
        Self {
            store,
            schema,
            dependencies,
            submitting: AtomicBool::new(false),
        }
    }

    /// The dependencies this form covers.
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Resolve the form's dependencies against current values.
    pub fn resolve(&self) -> Result<ResolvedGroup<'a>> {
        resolve_group(&self.dependencies, self.store, self.schema)
    }

    fn model_names(&self) -> Vec<String> {
        distinct_models(self.dependencies.iter())
    }

    /// Whether any referenced field differs from its saved baseline.
    pub fn is_form_state_dirty(&self) -> Result<bool> {
        for dependency in &self.dependencies {
            let current = self.store.get_model(&dependency.model_name)?;
            let saved = self.store.saved_model(&dependency.model_name)?;
            let changed = match saved {
                None => true,
                Some(saved) if dependency.is_wildcard() => saved != current,
                Some(saved) => {
                    saved.get(&dependency.field_name) != current.get(&dependency.field_name)
                }
            };
            if changed {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Whether every referenced field is valid. A form with no fields is valid.
    pub fn is_form_state_valid(&self) -> Result<bool> {
        if self.dependencies.is_empty() {
            return Ok(true);
        }
        Ok(self.resolve()?.is_valid())
    }

    /// Fields currently failing validation.
    pub fn invalid_fields(&self) -> Result<Vec<InvalidField>> {
        if self.dependencies.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.resolve()?.invalid_fields())
    }

    /// Current aggregate state.
    pub fn state(&self) -> Result<FormState> {
        if self.submitting.load(Ordering::SeqCst) {
            return Ok(FormState::Submitting);
        }
        Ok(if self.is_form_state_dirty()? {
            FormState::Dirty
        } else {
            FormState::Clean
        })
    }

    /// Set one field of the form, writing through its resolved model handle.
    ///
    /// The dependency must name a single schema field; wildcards are refused.
    pub fn set_field(&self, dependency: &Dependency, value: Value) -> Result<()> {
        let group = resolve_group(std::slice::from_ref(dependency), self.store, self.schema)?;
        let resolved = group
            .get(dependency)
            .ok_or_else(|| ModelError::MissingField {
                model: dependency.model_name.clone(),
                field: dependency.field_name.clone(),
            })?;
        resolved.set_value(value)
    }

    /// Validate, commit the edits as the new baseline, and save to the server.
    ///
    /// Refuses with [`FormError::Invalid`] when any field fails validation;
    /// nothing is committed in that case.
    pub async fn submit_changes<S: SimulationSource>(
        &self,
        source: &S,
    ) -> std::result::Result<SimulationInfo, FormError> {
        let invalid = self.invalid_fields()?;
        if !invalid.is_empty() {
            tracing::debug!("Refusing submit with {} invalid fields", invalid.len());
            return Err(FormError::Invalid { fields: invalid });
        }

        let _submitting = SubmitGuard::start(&self.submitting);
        let names = self.model_names();
        self.store.commit_models(&names)?;
        let info = self.store.simulation_info()?;
        let saved = self.store.save_to_server(source, &info).await?;
        tracing::info!("Submitted form covering models {:?}", names);
        Ok(saved)
    }

    /// Restore every referenced model to its saved baseline.
    pub fn cancel_changes(&self) -> Result<()> {
        let names = self.model_names();
        if names.is_empty() {
            return Ok(());
        }
        self.store.revert_models(&names)
    }
}

struct SubmitGuard<'g>(&'g AtomicBool);

impl<'g> SubmitGuard<'g> {
    fn start(flag: &'g AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
