// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Segment tree nodes.
//!
//! A [`Segment`] is one timed unit of work. Segments nest: each node owns
//! its subsegments exclusively, forming a tree rooted at a
//! [`crate::Trace`]. Lifecycle is `unstarted -> open -> closed`, with
//! `closed` terminal; [`Segment::is_open`] is the single predicate every
//! structural operation consults.
//!
//! The serialized form follows the X-Ray segment-document schema. Field
//! presence is governed per field by explicit predicates on the type, not
//! by a generic filtering pass, so the wire contract is auditable below.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::ids::{SegmentId, TraceId};

/// A timed unit of work, possibly containing nested subsegments.
#[derive(Debug, Serialize)]
pub struct Segment {
    id: SegmentId,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace_id: Option<TraceId>,
    #[serde(skip_serializing_if = "is_absent_or_empty")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_time: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    subsegments: Vec<Segment>,
    #[serde(
        rename = "type",
        skip_serializing_if = "is_false",
        serialize_with = "serialize_subsegment_type"
    )]
    independent: bool,
    #[serde(skip_serializing_if = "is_false")]
    fault: bool,
    #[serde(skip_serializing_if = "is_false")]
    error: bool,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    annotations: HashMap<String, Value>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    metadata: HashMap<String, Value>,
    #[serde(skip)]
    sampled: bool,
    // Cursor into `subsegments`; only ever advances.
    #[serde(skip)]
    last_open: usize,
}

impl Segment {
    /// Create an unstarted segment with a fresh random identifier.
    pub fn new() -> Self {
        Self {
            id: SegmentId::generate(),
            parent_id: None,
            trace_id: None,
            name: None,
            start_time: None,
            end_time: None,
            subsegments: Vec::new(),
            independent: false,
            fault: false,
            error: false,
            annotations: HashMap::new(),
            metadata: HashMap::new(),
            sampled: false,
            last_open: 0,
        }
    }

    /// Record the start timestamp, opening the segment.
    ///
    /// Unguarded: calling it on an already started segment overwrites the
    /// start time.
    pub fn begin(&mut self) -> &mut Self {
        self.start_time = Some(now());
        self
    }

    /// Record the end timestamp, closing the segment. Unguarded, like
    /// [`Segment::begin`]; there is no transition out of `closed`.
    pub fn end(&mut self) -> &mut Self {
        self.end_time = Some(now());
        self
    }

    /// A segment is open iff it has started and not yet ended.
    pub fn is_open(&self) -> bool {
        self.start_time.is_some() && self.end_time.is_none()
    }

    /// Attach a subsegment, which inherits this segment's sampling decision
    /// at the moment of attachment.
    ///
    /// Best effort: if this segment is not open the subsegment is silently
    /// dropped. Tracing must never raise an error into caller logic, so the
    /// loss is only visible at debug level.
    pub fn add_subsegment(&mut self, mut subsegment: Segment) -> &mut Self {
        if !self.is_open() {
            log::debug!(
                "dropping subsegment {}: parent segment {} is not open",
                subsegment.id,
                self.id
            );
            return self;
        }

        subsegment.sampled = self.sampled;
        self.subsegments.push(subsegment);
        self
    }

    /// Return the deepest currently open segment reachable from this node,
    /// or this node itself when no child is open.
    ///
    /// The scan starts at a cached cursor and advances it past every
    /// non-open child permanently. A closed child can never reopen, and a
    /// child that was attached but never began is skipped for good as well,
    /// so each child is inspected at most once over the segment's lifetime.
    /// First open child wins, depth first.
    pub fn current_mut(&mut self) -> &mut Segment {
        while self.last_open < self.subsegments.len()
            && !self.subsegments[self.last_open].is_open()
        {
            self.last_open += 1;
        }

        if self.last_open < self.subsegments.len() {
            self.subsegments[self.last_open].current_mut()
        } else {
            self
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    /// Flag a client-side error (4xx class).
    pub fn set_error(&mut self, error: bool) -> &mut Self {
        self.error = error;
        self
    }

    /// Flag a server-side fault (5xx class).
    pub fn set_fault(&mut self, fault: bool) -> &mut Self {
        self.fault = fault;
        self
    }

    pub fn set_sampled(&mut self, sampled: bool) -> &mut Self {
        self.sampled = sampled;
        self
    }

    pub fn is_sampled(&self) -> bool {
        self.sampled
    }

    /// Mark this node as a standalone subsegment, serialized with
    /// `"type": "subsegment"`.
    pub fn set_independent(&mut self, independent: bool) -> &mut Self {
        self.independent = independent;
        self
    }

    pub fn set_parent_id(&mut self, parent_id: impl Into<String>) -> &mut Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn set_trace_id(&mut self, trace_id: TraceId) -> &mut Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// Attach a filterable key/value pair.
    pub fn add_annotation(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// Attach a free-form key/value pair.
    pub fn add_metadata(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn id(&self) -> &SegmentId {
        &self.id
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn start_time(&self) -> Option<f64> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<f64> {
        self.end_time
    }

    pub fn subsegments(&self) -> &[Segment] {
        &self.subsegments
    }
}

impl Default for Segment {
    fn default() -> Self {
        Self::new()
    }
}

fn now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or_default()
}

pub(crate) fn is_absent_or_empty(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn serialize_subsegment_type<S: Serializer>(_: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str("subsegment")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::TraceId;

    fn open_segment() -> Segment {
        let mut segment = Segment::new();
        segment.begin();
        segment
    }

    fn closed_segment() -> Segment {
        let mut segment = open_segment();
        segment.end();
        segment
    }

    #[test]
    fn test_lifecycle() {
        let mut segment = Segment::new();
        assert!(!segment.is_open());

        segment.begin();
        assert!(segment.is_open());

        segment.end();
        assert!(!segment.is_open());
        assert!(segment.start_time().unwrap() <= segment.end_time().unwrap());
    }

    #[test]
    fn test_add_subsegment_to_unstarted_parent_is_a_no_op() {
        let mut parent = Segment::new();
        parent.add_subsegment(open_segment());
        assert!(parent.subsegments().is_empty());
    }

    #[test]
    fn test_add_subsegment_to_closed_parent_is_a_no_op() {
        let mut parent = closed_segment();
        parent.add_subsegment(open_segment());
        assert!(parent.subsegments().is_empty());
    }

    #[test]
    fn test_subsegment_inherits_sampling_on_attachment() {
        let mut parent = open_segment();
        parent.set_sampled(true);

        let child = Segment::new();
        assert!(!child.is_sampled());

        parent.add_subsegment(child);
        assert!(parent.subsegments()[0].is_sampled());
    }

    #[test]
    fn test_sampling_is_not_resynchronized_after_attachment() {
        let mut parent = open_segment();
        parent.add_subsegment(Segment::new());

        parent.set_sampled(true);
        assert!(!parent.subsegments()[0].is_sampled());
    }

    #[test]
    fn test_cursor_returns_first_open_child_then_self() {
        let mut parent = open_segment();
        let parent_id = parent.id().clone();

        let a = open_segment();
        let a_id = a.id().clone();
        parent.add_subsegment(a);
        parent.add_subsegment(closed_segment());

        assert_eq!(*parent.current_mut().id(), a_id);

        // Close A through the cursor; the next call falls back to the
        // parent without revisiting either child.
        parent.current_mut().end();
        assert_eq!(*parent.current_mut().id(), parent_id);
    }

    #[test]
    fn test_cursor_descends_into_open_descendants() {
        let mut parent = open_segment();
        let mut child = open_segment();
        let grandchild = open_segment();
        let grandchild_id = grandchild.id().clone();

        child.add_subsegment(grandchild);
        parent.add_subsegment(child);

        assert_eq!(*parent.current_mut().id(), grandchild_id);
    }

    #[test]
    fn test_cursor_picks_up_children_added_after_it_advanced() {
        let mut parent = open_segment();
        let parent_id = parent.id().clone();

        parent.add_subsegment(closed_segment());
        assert_eq!(*parent.current_mut().id(), parent_id);

        let late = open_segment();
        let late_id = late.id().clone();
        parent.add_subsegment(late);

        assert_eq!(*parent.current_mut().id(), late_id);
    }

    #[test]
    fn test_cursor_skips_unstarted_children_permanently() {
        let mut parent = open_segment();
        let parent_id = parent.id().clone();

        parent.add_subsegment(Segment::new());
        assert_eq!(*parent.current_mut().id(), parent_id);

        // Even if the passed-over child opens later, the cursor is past it.
        parent.subsegments[0].begin();
        assert_eq!(*parent.current_mut().id(), parent_id);
    }

    #[test]
    fn test_document_field_presence() {
        let mut segment = open_segment();
        segment
            .set_name("")
            .set_fault(false)
            .set_trace_id(TraceId::new("1-abc-def"));
        segment.add_subsegment(open_segment());

        let doc = serde_json::to_value(&segment).unwrap();
        let doc = doc.as_object().unwrap();

        assert!(doc.contains_key("id"));
        assert!(doc.contains_key("trace_id"));
        assert!(doc.contains_key("start_time"));
        assert_eq!(doc["subsegments"].as_array().unwrap().len(), 1);

        assert!(!doc.contains_key("name"));
        assert!(!doc.contains_key("fault"));
        assert!(!doc.contains_key("error"));
        assert!(!doc.contains_key("end_time"));
        assert!(!doc.contains_key("annotations"));
        assert!(!doc.contains_key("metadata"));
        assert!(!doc.contains_key("sampled"));
    }

    #[test]
    fn test_document_emits_set_fields() {
        let mut segment = closed_segment();
        segment
            .set_name("upstream call")
            .set_fault(true)
            .set_error(true)
            .set_parent_id("53995c3f42cd8ad8")
            .set_independent(true)
            .add_annotation("customer", "acme")
            .add_metadata("attempts", 3);

        let doc = serde_json::to_value(&segment).unwrap();

        assert_eq!(doc["name"], "upstream call");
        assert_eq!(doc["parent_id"], "53995c3f42cd8ad8");
        assert_eq!(doc["type"], "subsegment");
        assert_eq!(doc["fault"], true);
        assert_eq!(doc["error"], true);
        assert_eq!(doc["annotations"]["customer"], "acme");
        assert_eq!(doc["metadata"]["attempts"], 3);
        assert!(doc.get("subsegments").is_none());
    }

    #[test]
    fn test_subsegments_serialize_in_attachment_order() {
        let mut parent = open_segment();
        for name in ["first", "second", "third"] {
            let mut child = open_segment();
            child.set_name(name);
            parent.add_subsegment(child);
        }

        let doc = serde_json::to_value(&parent).unwrap();
        let names: Vec<&str> = doc["subsegments"]
            .as_array()
            .unwrap()
            .iter()
            .map(|child| child["name"].as_str().unwrap())
            .collect();

        assert_eq!(names, ["first", "second", "third"]);
    }
}
