//! Side-channel payload index.
//!
//! Assistant messages can carry structured data that is not part of their
//! displayed text: betting market objects, article objects, follow-up
//! suggestions. The index maps each view message's stable key to its
//! payloads, and tracks which widgets were restored from history so the
//! rendering boundary can skip their entrance animation.
//!
//! The index is rebuilt when history is (re)loaded and extended
//! incrementally as live stream events attach payloads mid-turn.

use std::collections::{HashMap, HashSet};

use crate::models::{MessageRole, RawMessage};

/// Widget kinds derived from side-channel payloads. `Markets` and `Articles`
/// are both rendered from the objects payload; `Suggestions` from the
/// suggestions payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    Markets,
    Articles,
    Suggestions,
}

impl WidgetKind {
    /// Stable name used in composite marker keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetKind::Markets => "markets",
            WidgetKind::Articles => "articles",
            WidgetKind::Suggestions => "suggestions",
        }
    }
}

/// Keyed storage for per-message payloads plus the "already displayed"
/// marker set.
#[derive(Debug, Default)]
pub struct SideChannelIndex {
    /// Message key -> structured objects
    objects: HashMap<u64, Vec<serde_json::Value>>,
    /// Message key -> suggestion strings
    suggestions: HashMap<u64, Vec<String>>,
    /// Composite "kind:key" markers for widgets restored from history;
    /// marked widgets render statically instead of animating in
    displayed: HashSet<String>,
}

impl SideChannelIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the index from keyed raw history messages.
    ///
    /// Only assistant messages are scanned. Every non-empty payload is also
    /// recorded in the marker set: history content has been displayed before
    /// and must not animate in again.
    pub fn rebuild<'a>(&mut self, keyed: impl IntoIterator<Item = (u64, &'a RawMessage)>) {
        self.objects.clear();
        self.suggestions.clear();
        self.displayed.clear();

        for (key, raw) in keyed {
            if raw.role() != Some(MessageRole::Assistant) {
                continue;
            }

            let objects = raw.extract_objects();
            if !objects.is_empty() {
                self.objects.insert(key, objects);
                self.mark_displayed(WidgetKind::Markets, key);
                self.mark_displayed(WidgetKind::Articles, key);
            }

            let suggestions = raw.extract_suggestions();
            if !suggestions.is_empty() {
                self.suggestions.insert(key, suggestions);
                self.mark_displayed(WidgetKind::Suggestions, key);
            }
        }
    }

    /// Attach objects streamed during a live turn. No marker is recorded, so
    /// the widget animates in.
    pub fn attach_objects(&mut self, key: u64, payload: Vec<serde_json::Value>) {
        if payload.is_empty() {
            return;
        }
        self.objects.insert(key, payload);
    }

    /// Attach suggestions streamed during a live turn. No marker is recorded.
    pub fn attach_suggestions(&mut self, key: u64, payload: Vec<String>) {
        if payload.is_empty() {
            return;
        }
        self.suggestions.insert(key, payload);
    }

    /// Objects for a message key, empty if none were attached.
    pub fn objects(&self, key: u64) -> &[serde_json::Value] {
        self.objects.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Suggestions for a message key, empty if none were attached.
    pub fn suggestions(&self, key: u64) -> &[String] {
        self.suggestions.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether a widget should animate in: true unless the payload was
    /// restored from history.
    pub fn should_animate(&self, kind: WidgetKind, key: u64) -> bool {
        !self.displayed.contains(&Self::marker_key(kind, key))
    }

    /// Remove payloads attached to a message key (used when an abandoned
    /// placeholder is discarded).
    pub fn remove(&mut self, key: u64) {
        self.objects.remove(&key);
        self.suggestions.remove(&key);
        for kind in [
            WidgetKind::Markets,
            WidgetKind::Articles,
            WidgetKind::Suggestions,
        ] {
            self.displayed.remove(&Self::marker_key(kind, key));
        }
    }

    /// Drop everything (thread switch or unmount).
    pub fn clear(&mut self) {
        self.objects.clear();
        self.suggestions.clear();
        self.displayed.clear();
    }

    fn mark_displayed(&mut self, kind: WidgetKind, key: u64) {
        self.displayed.insert(Self::marker_key(kind, key));
    }

    fn marker_key(kind: WidgetKind, key: u64) -> String {
        format!("{}-{}", kind.as_str(), key)
    }
}
