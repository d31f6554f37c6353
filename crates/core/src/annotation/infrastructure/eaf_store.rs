use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use thiserror::Error;

use crate::annotation::domain::annotation_document::{AnnotationDocument, DocumentError};
use crate::annotation::domain::annotation_store::AnnotationStore;
use crate::annotation::domain::span::Span;
use crate::annotation::domain::tier::Tier;
use crate::shared::constants::PLACEHOLDER_TIER_ID;

const LINGUISTIC_TYPE_ID: &str = "default-lt";
const MAX_REFERENCE_DEPTH: usize = 64;

/// Standard ELAN constraint stereotypes written into every document.
const CONSTRAINTS: [(&str, &str); 4] = [
    (
        "Time subdivision of parent annotation's time interval, no time gaps allowed within this interval",
        "Time_Subdivision",
    ),
    (
        "Symbolic subdivision of a parent annotation. Annotations refering to the same parent are ordered",
        "Symbolic_Subdivision",
    ),
    ("1-1 association with a parent annotation", "Symbolic_Association"),
    (
        "Time alignable annotations within the parent annotation's time interval, gaps are allowed",
        "Included_In",
    ),
];

#[derive(Error, Debug)]
pub enum EafError {
    #[error("failed to access {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("XML attribute error: {0}")]
    Attribute(#[from] AttrError),
    #[error("write error: {0}")]
    Io(#[from] std::io::Error),
    #[error("<{element}> is missing attribute {attribute}")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
    #[error("time slot {slot} has invalid value {value:?}")]
    InvalidTimeValue { slot: String, value: String },
    #[error("annotation {annotation} refers to unknown time slot {slot}")]
    UnknownTimeSlot { annotation: String, slot: String },
    #[error("annotation {annotation} refers to unknown annotation {target}")]
    UnknownAnnotation { annotation: String, target: String },
    #[error("annotation {0} has a reference chain that is too deep or cyclic")]
    ReferenceTooDeep(String),
    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Annotation store for ELAN `.eaf` files.
///
/// Only tiers and their aligned spans are modelled; other header data in
/// source files is not carried over. New documents are stamped with the
/// current time unless the store was built with a fixed date.
#[derive(Debug, Default)]
pub struct EafAnnotationStore {
    fixed_date: Option<String>,
}

impl EafAnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose new documents always carry `date`, for reproducible output.
    pub fn with_fixed_date(date: impl Into<String>) -> Self {
        Self {
            fixed_date: Some(date.into()),
        }
    }

    fn creation_date(&self) -> String {
        match &self.fixed_date {
            Some(date) => date.clone(),
            None => chrono::Local::now()
                .format("%Y-%m-%dT%H:%M:%S%:z")
                .to_string(),
        }
    }
}

impl AnnotationStore for EafAnnotationStore {
    fn open(&self, path: &Path) -> Result<AnnotationDocument, Box<dyn std::error::Error>> {
        let xml = fs::read_to_string(path).map_err(|e| EafError::File {
            path: path.to_path_buf(),
            source: e,
        })?;
        let document = parse_eaf(&xml)
            .map_err(|e| format!("Failed to parse {}: {e}", path.display()))?;
        Ok(document)
    }

    fn create(&self) -> AnnotationDocument {
        let mut document = AnnotationDocument::with_date(self.creation_date());
        document.push_tier(Tier::new(PLACEHOLDER_TIER_ID)).ok();
        document
    }

    fn save(
        &self,
        document: &AnnotationDocument,
        path: &Path,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let bytes = render_eaf(document)?;
        fs::write(path, bytes).map_err(|e| EafError::File {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(())
    }
}

enum Anchor {
    Aligned { slot1: String, slot2: String },
    Reference { target: String },
}

struct RawAnnotation {
    id: String,
    anchor: Anchor,
    value: String,
}

struct RawTier {
    id: String,
    annotations: Vec<RawAnnotation>,
}

/// Parses EAF XML into a document of tiers and time-aligned spans.
///
/// Reference annotations take the bounds of the annotation they point to.
/// Annotations anchored to slots without a time value are unaligned and
/// are left out.
pub fn parse_eaf(xml: &str) -> Result<AnnotationDocument, EafError> {
    let mut reader = Reader::from_str(xml);

    let mut date = None;
    let mut slots: HashMap<String, Option<u64>> = HashMap::new();
    let mut tiers: Vec<RawTier> = Vec::new();
    let mut current: Option<RawAnnotation> = None;
    let mut in_value = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if e.name().as_ref() == b"ANNOTATION_VALUE" {
                    in_value = true;
                } else {
                    read_element(&e, &mut date, &mut slots, &mut tiers, &mut current)?;
                }
            }
            Event::Empty(e) => {
                read_element(&e, &mut date, &mut slots, &mut tiers, &mut current)?;
                if is_annotation(e.name().as_ref()) {
                    finish_annotation(&mut tiers, &mut current);
                }
            }
            Event::Text(t) if in_value => {
                if let Some(annotation) = current.as_mut() {
                    annotation.value.push_str(&t.unescape()?);
                }
            }
            Event::CData(t) if in_value => {
                if let Some(annotation) = current.as_mut() {
                    annotation
                        .value
                        .push_str(&String::from_utf8_lossy(&t.into_inner()));
                }
            }
            Event::End(e) => {
                let name = e.name();
                if name.as_ref() == b"ANNOTATION_VALUE" {
                    in_value = false;
                } else if is_annotation(name.as_ref()) {
                    finish_annotation(&mut tiers, &mut current);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    resolve_document(date, &slots, tiers)
}

fn is_annotation(name: &[u8]) -> bool {
    name == b"ALIGNABLE_ANNOTATION" || name == b"REF_ANNOTATION"
}

fn read_element(
    e: &BytesStart,
    date: &mut Option<String>,
    slots: &mut HashMap<String, Option<u64>>,
    tiers: &mut Vec<RawTier>,
    current: &mut Option<RawAnnotation>,
) -> Result<(), EafError> {
    match e.name().as_ref() {
        b"ANNOTATION_DOCUMENT" => *date = attr(e, "DATE")?,
        b"TIME_SLOT" => {
            let id = required_attr(e, "TIME_SLOT", "TIME_SLOT_ID")?;
            let value = match attr(e, "TIME_VALUE")? {
                Some(raw) => Some(raw.trim().parse::<u64>().map_err(|_| {
                    EafError::InvalidTimeValue {
                        slot: id.clone(),
                        value: raw.clone(),
                    }
                })?),
                None => None,
            };
            slots.insert(id, value);
        }
        b"TIER" => tiers.push(RawTier {
            id: required_attr(e, "TIER", "TIER_ID")?,
            annotations: Vec::new(),
        }),
        b"ALIGNABLE_ANNOTATION" => {
            *current = Some(RawAnnotation {
                id: required_attr(e, "ALIGNABLE_ANNOTATION", "ANNOTATION_ID")?,
                anchor: Anchor::Aligned {
                    slot1: required_attr(e, "ALIGNABLE_ANNOTATION", "TIME_SLOT_REF1")?,
                    slot2: required_attr(e, "ALIGNABLE_ANNOTATION", "TIME_SLOT_REF2")?,
                },
                value: String::new(),
            })
        }
        b"REF_ANNOTATION" => {
            *current = Some(RawAnnotation {
                id: required_attr(e, "REF_ANNOTATION", "ANNOTATION_ID")?,
                anchor: Anchor::Reference {
                    target: required_attr(e, "REF_ANNOTATION", "ANNOTATION_REF")?,
                },
                value: String::new(),
            })
        }
        _ => {}
    }
    Ok(())
}

fn finish_annotation(tiers: &mut [RawTier], current: &mut Option<RawAnnotation>) {
    if let (Some(tier), Some(annotation)) = (tiers.last_mut(), current.take()) {
        tier.annotations.push(annotation);
    }
}

fn attr(e: &BytesStart, name: &str) -> Result<Option<String>, EafError> {
    match e.try_get_attribute(name)? {
        Some(a) => Ok(Some(a.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}

fn required_attr(
    e: &BytesStart,
    element: &'static str,
    attribute: &'static str,
) -> Result<String, EafError> {
    attr(e, attribute)?.ok_or(EafError::MissingAttribute { element, attribute })
}

fn resolve_document(
    date: Option<String>,
    slots: &HashMap<String, Option<u64>>,
    tiers: Vec<RawTier>,
) -> Result<AnnotationDocument, EafError> {
    let by_id: HashMap<&str, &RawAnnotation> = tiers
        .iter()
        .flat_map(|t| t.annotations.iter())
        .map(|a| (a.id.as_str(), a))
        .collect();

    let mut document = AnnotationDocument::new();
    document.date = date;
    for raw in &tiers {
        let mut tier = Tier::new(raw.id.as_str());
        for annotation in &raw.annotations {
            if let Some((start_ms, end_ms)) = resolve_bounds(annotation, slots, &by_id)? {
                tier.push(Span::new(start_ms, end_ms, annotation.value.as_str()));
            }
        }
        document.push_tier(tier)?;
    }
    Ok(document)
}

fn resolve_bounds<'a>(
    annotation: &'a RawAnnotation,
    slots: &HashMap<String, Option<u64>>,
    by_id: &HashMap<&str, &'a RawAnnotation>,
) -> Result<Option<(u64, u64)>, EafError> {
    let mut node = annotation;
    for _ in 0..MAX_REFERENCE_DEPTH {
        match &node.anchor {
            Anchor::Aligned { slot1, slot2 } => {
                let time = |slot: &String| {
                    slots
                        .get(slot)
                        .copied()
                        .ok_or_else(|| EafError::UnknownTimeSlot {
                            annotation: node.id.clone(),
                            slot: slot.clone(),
                        })
                };
                return Ok(match (time(slot1)?, time(slot2)?) {
                    (Some(start), Some(end)) => Some((start, end)),
                    _ => None,
                });
            }
            Anchor::Reference { target } => {
                node = by_id
                    .get(target.as_str())
                    .copied()
                    .ok_or_else(|| EafError::UnknownAnnotation {
                        annotation: node.id.clone(),
                        target: target.clone(),
                    })?;
            }
        }
    }
    Err(EafError::ReferenceTooDeep(annotation.id.clone()))
}

/// Serializes a document as EAF 3.0 XML.
///
/// Time slots and annotation ids are numbered in tier order, then span order,
/// so equal documents always render to identical bytes.
pub fn render_eaf(document: &AnnotationDocument) -> Result<Vec<u8>, EafError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);
    let date = document.date.clone().unwrap_or_default();
    let annotation_count = document.span_count();

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(
        BytesStart::new("ANNOTATION_DOCUMENT").with_attributes([
            ("AUTHOR", ""),
            ("DATE", date.as_str()),
            ("FORMAT", "3.0"),
            ("VERSION", "3.0"),
            ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
            (
                "xsi:noNamespaceSchemaLocation",
                "http://www.mpi.nl/tools/elan/EAFv3.0.xsd",
            ),
        ]),
    ))?;

    writer.write_event(Event::Start(
        BytesStart::new("HEADER").with_attributes([("MEDIA_FILE", ""), ("TIME_UNITS", "milliseconds")]),
    ))?;
    writer.write_event(Event::Start(
        BytesStart::new("PROPERTY").with_attributes([("NAME", "lastUsedAnnotationId")]),
    ))?;
    writer.write_event(Event::Text(BytesText::new(&annotation_count.to_string())))?;
    writer.write_event(Event::End(BytesEnd::new("PROPERTY")))?;
    writer.write_event(Event::End(BytesEnd::new("HEADER")))?;

    if annotation_count == 0 {
        writer.write_event(Event::Empty(BytesStart::new("TIME_ORDER")))?;
    } else {
        writer.write_event(Event::Start(BytesStart::new("TIME_ORDER")))?;
        let times = document
            .tiers()
            .iter()
            .flat_map(|t| t.spans())
            .flat_map(|s| [s.start_ms, s.end_ms]);
        for (idx, time) in times.enumerate() {
            let id = format!("ts{}", idx + 1);
            let value = time.to_string();
            writer.write_event(Event::Empty(BytesStart::new("TIME_SLOT").with_attributes([
                ("TIME_SLOT_ID", id.as_str()),
                ("TIME_VALUE", value.as_str()),
            ])))?;
        }
        writer.write_event(Event::End(BytesEnd::new("TIME_ORDER")))?;
    }

    let mut annotation_id = 0usize;
    for tier in document.tiers() {
        let start = BytesStart::new("TIER").with_attributes([
            ("LINGUISTIC_TYPE_REF", LINGUISTIC_TYPE_ID),
            ("TIER_ID", tier.name()),
        ]);
        if tier.is_empty() {
            writer.write_event(Event::Empty(start))?;
            continue;
        }
        writer.write_event(Event::Start(start))?;
        for span in tier.spans() {
            annotation_id += 1;
            write_annotation(&mut writer, annotation_id, span)?;
        }
        writer.write_event(Event::End(BytesEnd::new("TIER")))?;
    }

    writer.write_event(Event::Empty(BytesStart::new("LINGUISTIC_TYPE").with_attributes([
        ("GRAPHIC_REFERENCES", "false"),
        ("LINGUISTIC_TYPE_ID", LINGUISTIC_TYPE_ID),
        ("TIME_ALIGNABLE", "true"),
    ])))?;
    for (description, stereotype) in CONSTRAINTS {
        writer.write_event(Event::Empty(BytesStart::new("CONSTRAINT").with_attributes([
            ("DESCRIPTION", description),
            ("STEREOTYPE", stereotype),
        ])))?;
    }

    writer.write_event(Event::End(BytesEnd::new("ANNOTATION_DOCUMENT")))?;
    Ok(writer.into_inner())
}

fn write_annotation(writer: &mut Writer<Vec<u8>>, id: usize, span: &Span) -> Result<(), EafError> {
    // Slots were numbered two per span in the same traversal order
    let annotation_id = format!("a{id}");
    let slot1 = format!("ts{}", id * 2 - 1);
    let slot2 = format!("ts{}", id * 2);

    writer.write_event(Event::Start(BytesStart::new("ANNOTATION")))?;
    writer.write_event(Event::Start(
        BytesStart::new("ALIGNABLE_ANNOTATION").with_attributes([
            ("ANNOTATION_ID", annotation_id.as_str()),
            ("TIME_SLOT_REF1", slot1.as_str()),
            ("TIME_SLOT_REF2", slot2.as_str()),
        ]),
    ))?;
    if span.label.is_empty() {
        writer.write_event(Event::Empty(BytesStart::new("ANNOTATION_VALUE")))?;
    } else {
        writer.write_event(Event::Start(BytesStart::new("ANNOTATION_VALUE")))?;
        writer.write_event(Event::Text(BytesText::new(&span.label)))?;
        writer.write_event(Event::End(BytesEnd::new("ANNOTATION_VALUE")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("ALIGNABLE_ANNOTATION")))?;
    writer.write_event(Event::End(BytesEnd::new("ANNOTATION")))?;
    Ok(())
}
