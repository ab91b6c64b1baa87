use std::cell::RefCell;
use std::rc::Rc;

use experience_assets::LoaderSet;
use experience_host::Host;
use experience_render::{DebugTextRenderer, RenderBackend, RenderError};

use crate::{Experience, ExperienceConfig, ExperienceError};

type BackendFactory = Box<dyn FnMut() -> Result<Box<dyn RenderBackend>, RenderError>>;

/// Holds the single active [`Experience`] of a run.
///
/// Passed explicitly to whoever needs the experience instead of living in a
/// global. The first `get_or_create` builds the instance; later calls hand
/// back the same `Rc` and ignore their arguments until `destroy` empties
/// the slot.
pub struct ExperienceContext {
    active: Option<Rc<RefCell<Experience>>>,
    backend: BackendFactory,
    loaders: LoaderSet,
    created: u64,
}

impl ExperienceContext {
    pub fn new(
        backend: impl FnMut() -> Result<Box<dyn RenderBackend>, RenderError> + 'static,
    ) -> Self {
        Self {
            active: None,
            backend: Box::new(backend),
            loaders: LoaderSet::default(),
            created: 0,
        }
    }

    /// Context whose experiences render to text.
    pub fn headless() -> Self {
        Self::new(|| Ok(Box::new(DebugTextRenderer::new()) as Box<dyn RenderBackend>))
    }

    pub fn with_loaders(mut self, loaders: LoaderSet) -> Self {
        self.loaders = loaders;
        self
    }

    /// Return the active experience, constructing it on the first call.
    pub fn get_or_create(
        &mut self,
        host: &dyn Host,
        config: &ExperienceConfig,
    ) -> Result<Rc<RefCell<Experience>>, ExperienceError> {
        if let Some(active) = &self.active {
            return Ok(Rc::clone(active));
        }
        let backend = (self.backend)()?;
        let experience = Experience::with_loaders(host, config, backend, &self.loaders)?;
        let experience = Rc::new(RefCell::new(experience));
        self.active = Some(Rc::clone(&experience));
        self.created += 1;
        Ok(experience)
    }

    pub fn current(&self) -> Option<Rc<RefCell<Experience>>> {
        self.active.clone()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Instances constructed over the context's lifetime.
    pub fn created(&self) -> u64 {
        self.created
    }

    /// Destroy the active experience and empty the slot. Returns false if
    /// there was nothing to destroy.
    pub fn destroy(&mut self) -> bool {
        match self.active.take() {
            Some(experience) => {
                experience.borrow_mut().destroy();
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for ExperienceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExperienceContext")
            .field("active", &self.active.is_some())
            .field("created", &self.created)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HostEvent;
    use experience_host::HeadlessHost;

    #[test]
    fn repeated_construction_returns_same_instance() {
        let host = HeadlessHost::default();
        let mut context = ExperienceContext::headless();
        let config = ExperienceConfig::default();

        let a = context.get_or_create(&host, &config).unwrap();
        let other = ExperienceConfig::default().with_hash("#debug");
        let b = context.get_or_create(&host, &other).unwrap();

        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(context.created(), 1);
        // the second config was ignored
        assert!(!b.borrow().debug().is_active());
    }

    #[test]
    fn destroy_clears_slot_and_allows_a_new_instance() {
        let host = HeadlessHost::default();
        let mut context = ExperienceContext::headless();
        let config = ExperienceConfig::default();

        let first = context.get_or_create(&host, &config).unwrap();
        assert!(context.destroy());
        assert!(!context.is_active());
        assert!(first.borrow().is_destroyed());
        assert!(!context.destroy());

        let second = context.get_or_create(&host, &config).unwrap();
        assert!(!Rc::ptr_eq(&first, &second));
        assert_eq!(context.created(), 2);

        second
            .borrow_mut()
            .handle(&host, HostEvent::Idle)
            .unwrap();
        assert_eq!(second.borrow().world().builds(), 1);
    }

    #[test]
    fn backend_failure_leaves_slot_empty() {
        let host = HeadlessHost::default();
        let mut context =
            ExperienceContext::new(|| Err(RenderError::Backend("no adapter".into())));
        let result = context.get_or_create(&host, &ExperienceConfig::default());
        assert!(matches!(result, Err(ExperienceError::Render(_))));
        assert!(!context.is_active());
    }
}
