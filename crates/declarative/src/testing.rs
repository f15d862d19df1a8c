//! In-memory resource used by the engine tests

use crate::resource::{Resource, ResourceError};
use crate::types::ResourceData;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

impl Widget {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            size: None,
        }
    }

    fn normalized(&self) -> Self {
        Self {
            name: self.name.clone(),
            size: Some(self.size.unwrap_or(1)),
        }
    }
}

#[derive(Debug)]
pub enum WidgetError {
    NotFound(String),
    Failed(String),
}

impl fmt::Display for WidgetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "widget {} not found", id),
            Self::Failed(msg) => write!(f, "widget failure: {}", msg),
        }
    }
}

impl std::error::Error for WidgetError {}

impl ResourceError for WidgetError {
    fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[derive(Default)]
pub struct MemoryResource {
    store: Mutex<BTreeMap<String, Widget>>,
    next: AtomicUsize,
    fail_reads: AtomicBool,
    fail_updates: AtomicBool,
    fail_after_create: AtomicBool,
}

impl MemoryResource {
    pub fn seed(&self, widget: Widget) -> String {
        let id = format!("w-{}", self.next.fetch_add(1, Ordering::SeqCst));
        self.store.lock().unwrap().insert(id.clone(), widget.normalized());
        id
    }

    pub fn get(&self, id: &str) -> Option<Widget> {
        self.store.lock().unwrap().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.store.lock().unwrap().len()
    }

    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    pub fn fail_updates(&self) {
        self.fail_updates.store(true, Ordering::SeqCst);
    }

    pub fn fail_after_create(&self) {
        self.fail_after_create.store(true, Ordering::SeqCst);
    }

    fn id_of(data: &ResourceData<Widget>) -> Result<String, WidgetError> {
        data.id()
            .map(str::to_string)
            .ok_or_else(|| WidgetError::Failed("missing id".into()))
    }
}

impl Resource for MemoryResource {
    type Config = Widget;
    type Error = WidgetError;

    fn resource_type(&self) -> &'static str {
        "widget"
    }

    fn create(&self, data: &mut ResourceData<Widget>) -> Result<(), WidgetError> {
        let id = self.seed(data.config.clone());
        data.set_id(id);
        if self.fail_after_create.load(Ordering::SeqCst) {
            return Err(WidgetError::Failed("post-create step".into()));
        }
        self.read(data)
    }

    fn read(&self, data: &mut ResourceData<Widget>) -> Result<(), WidgetError> {
        let id = Self::id_of(data)?;
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(WidgetError::Failed("read".into()));
        }
        data.config = self.get(&id).ok_or(WidgetError::NotFound(id))?;
        Ok(())
    }

    fn update(&self, data: &mut ResourceData<Widget>) -> Result<(), WidgetError> {
        let id = Self::id_of(data)?;
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(WidgetError::Failed("update".into()));
        }
        let mut store = self.store.lock().unwrap();
        let slot = store.get_mut(&id).ok_or_else(|| WidgetError::NotFound(id.clone()))?;
        *slot = data.config.normalized();
        data.config = slot.clone();
        Ok(())
    }

    fn delete(&self, data: &ResourceData<Widget>) -> Result<(), WidgetError> {
        let id = Self::id_of(data)?;
        self.store
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(WidgetError::NotFound(id))
    }

    fn exists(&self, data: &ResourceData<Widget>) -> Result<bool, WidgetError> {
        let id = Self::id_of(data)?;
        Ok(self.get(&id).is_some())
    }

    fn normalize(&self, config: &Widget) -> Widget {
        config.normalized()
    }
}
