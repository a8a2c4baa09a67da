use crate::boundary::EntityProvider;
use crate::config::GridSpacing;
use crate::error::BoardError;
use crate::model::{str_enum, GraphDocument, NewNode, Node, NodeData, NodeType, Position};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Character,
    WorldNote,
    PlotEvent,
    Chapter,
}

str_enum!(EntityKind {
    Character => "character",
    WorldNote => "worldNote",
    PlotEvent => "plotEvent",
    Chapter => "chapter",
});

impl EntityKind {
    pub fn node_type(&self) -> NodeType {
        match self {
            EntityKind::Character => NodeType::Character,
            EntityKind::WorldNote => NodeType::WorldNote,
            EntityKind::PlotEvent => NodeType::PlotEvent,
            EntityKind::Chapter => NodeType::Chapter,
        }
    }
}

/// A row from one of the entity tables, as the providers return it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExternalEntity {
    pub id: String,
    #[serde(alias = "name")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportCandidate {
    pub kind: EntityKind,
    pub entity: ExternalEntity,
}

impl ImportCandidate {
    pub fn new(kind: EntityKind, entity: ExternalEntity) -> Self {
        ImportCandidate { kind, entity }
    }

    pub fn source_id(&self) -> &str {
        &self.entity.id
    }

    fn node_data(&self) -> NodeData {
        let entity = &self.entity;
        NodeData {
            label: entity.title.clone(),
            description: entity.description.clone(),
            color: entity.color.clone(),
            source_id: Some(entity.id.clone()),
            role: match self.kind {
                EntityKind::Character => entity.role.clone(),
                _ => None,
            },
            category: match self.kind {
                EntityKind::WorldNote => entity.category.clone(),
                _ => None,
            },
        }
    }
}

/// What the import dialog shows: importable items and those already on the board.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportPlan {
    pub eligible: Vec<ImportCandidate>,
    pub disabled: Vec<ImportCandidate>,
}

pub fn plan_import(candidates: Vec<ImportCandidate>, existing: &HashSet<String>) -> ImportPlan {
    let (disabled, eligible): (Vec<_>, Vec<_>) = candidates
        .into_iter()
        .partition(|c| existing.contains(c.source_id()));
    debug!(eligible = eligible.len(), disabled = disabled.len(), "import planned");
    ImportPlan { eligible, disabled }
}

/// Query every provider for the work. A failing provider is skipped.
pub fn collect_candidates(providers: &[&dyn EntityProvider], work_id: &str) -> Vec<ImportCandidate> {
    let mut candidates = Vec::new();
    for provider in providers {
        match provider.list_for_work(work_id) {
            Ok(entities) => candidates.extend(
                entities
                    .into_iter()
                    .map(|entity| ImportCandidate::new(provider.kind(), entity)),
            ),
            Err(err) => {
                warn!(kind = %provider.kind(), error = %err, "entity provider failed");
            }
        }
    }
    candidates
}

/// Cell centers of a square-ish grid of `n` items centered on `center`.
pub fn grid_positions(n: usize, center: Position, spacing: GridSpacing) -> Vec<Position> {
    if n == 0 {
        return Vec::new();
    }
    let columns = (n as f64).sqrt().ceil() as usize;
    let rows = n.div_ceil(columns);
    let origin = center.offset(
        -((columns - 1) as f64) * spacing.x / 2.0,
        -((rows - 1) as f64) * spacing.y / 2.0,
    );

    (0..n)
        .map(|i| {
            let (row, col) = (i / columns, i % columns);
            origin.offset(col as f64 * spacing.x, row as f64 * spacing.y)
        })
        .collect()
}

/// Add the accepted candidates to the board. Candidates whose source is
/// already present (or repeated in `accepted`) are skipped.
pub fn import_entities(
    doc: &mut GraphDocument,
    accepted: &[ImportCandidate],
    center: Position,
    spacing: GridSpacing,
) -> Result<Vec<Node>, BoardError> {
    let mut seen = doc.source_ids();
    let fresh: Vec<&ImportCandidate> = accepted
        .iter()
        .filter(|c| seen.insert(c.source_id().to_string()))
        .collect();

    let positions = grid_positions(fresh.len(), center, spacing);
    let mut added = Vec::with_capacity(fresh.len());
    for (candidate, position) in fresh.into_iter().zip(positions) {
        let spec = NewNode::new(candidate.kind.node_type(), position).with_data(candidate.node_data());
        added.push(doc.add_node(spec)?);
    }

    info!(requested = accepted.len(), imported = added.len(), "entities imported");
    Ok(added)
}
