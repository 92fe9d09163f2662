//! Anonymising masks for validated matrices.
//!
//! A [`Mask`] lives in the aligned frame of the matrix it was generated for.
//! [`Mask::in_raw_frame`] maps it back onto the grid the caller scanned.

use std::collections::VecDeque;
use std::ops::Range;

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::core::BinaryMatrix;
use crate::patterns::{
    Axis, Cell, DigitTable, FieldCodec, FieldSpec, MaskScheme, PatternId, PatternSpec,
    VendorTable, Word,
};
use crate::tdm::TrackingDotMatrix;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// How much of the pattern a mask covers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskPolicy {
    /// Saturate every payload and check cell.
    ///
    /// The masked tile no longer validates: every one-hot group carries
    /// more than one dot and every parity line is saturated. Readers see a grid
    /// that matches no pattern rather than a different payload.
    #[default]
    Full,
    /// Move every payload group to a different valid assignment.
    Strategic,
}

/// Mask generation settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskParams {
    #[serde(default)]
    pub policy: MaskPolicy,
    /// Seed for the strategic choices; equal seeds give equal masks.
    #[serde(default)]
    pub seed: u64,
    /// Rewrite a manufacturer code slot to another known vendor.
    #[serde(default)]
    pub spoof_manufacturer: bool,
}

impl Default for MaskParams {
    fn default() -> Self {
        Self {
            policy: MaskPolicy::Full,
            seed: 0,
            spoof_manufacturer: false,
        }
    }
}

impl MaskParams {
    pub fn strategic(seed: u64) -> Self {
        Self {
            policy: MaskPolicy::Strategic,
            seed,
            ..Self::default()
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MaskError {
    #[error("no alternative assignment for group(s): {}", .groups.join(", "))]
    NotAnonymisable { groups: Vec<String> },
}

/// Dots to add to a tile, in the aligned frame.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Mask {
    pub pattern: PatternId,
    pub policy: MaskPolicy,
    /// Cells to set, redundant copies included.
    pub grid: BinaryMatrix,
    /// Source cells superseded by a replacement slot. Always blank for the
    /// full policy and for parity patterns.
    pub cleared: BinaryMatrix,
}

impl Mask {
    /// What a reader of the masked tile decodes: the source with cleared
    /// slots removed and the mask dots added, copies rewritten.
    pub fn anonymised_view(&self, tdm: &TrackingDotMatrix) -> BinaryMatrix {
        let mut view = tdm.replicated();
        for (i, j) in self.cleared.ones() {
            view.set(i, j, false);
        }
        for (i, j) in self.grid.ones() {
            view.set(i, j, true);
        }
        tdm.spec().replicate(&mut view);
        view
    }

    /// The mask in the orientation and offset of the scanned grid.
    pub fn in_raw_frame(&self, tdm: &TrackingDotMatrix) -> BinaryMatrix {
        tdm.to_raw_frame(&self.grid)
    }
}

/// Builds masks for validated matrices.
#[derive(Clone, Debug, Default)]
pub struct MaskGenerator {
    params: MaskParams,
}

impl MaskGenerator {
    pub fn new(params: MaskParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &MaskParams {
        &self.params
    }

    /// Generate a mask for `tdm`.
    ///
    /// The strategic policy fails with [`MaskError::NotAnonymisable`] when a
    /// group has no assignment other than the current one.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, tdm), fields(pattern = %tdm.pattern()))
    )]
    pub fn generate(&self, tdm: &TrackingDotMatrix) -> Result<Mask, MaskError> {
        match self.params.policy {
            MaskPolicy::Full => Ok(full_mask(tdm)),
            MaskPolicy::Strategic => self.strategic_mask(tdm),
        }
    }

    fn strategic_mask(&self, tdm: &TrackingDotMatrix) -> Result<Mask, MaskError> {
        let spec = tdm.spec();
        let source = tdm.cropped();
        let mut working = source.clone();
        let mut rng = StdRng::seed_from_u64(self.params.seed);

        let failures = match &spec.mask {
            MaskScheme::OneHotSlots => {
                one_hot_slots(spec, &mut working, &mut rng, self.params.spoof_manufacturer)
            }
            MaskScheme::ParityCycles {
                axis,
                lines,
                positions,
            } => parity_cycles(
                spec,
                &mut working,
                &mut rng,
                *axis,
                lines.clone(),
                positions.clone(),
            ),
        };
        if !failures.is_empty() {
            warn!("{}: cannot anonymise {:?}", spec.id, failures);
            return Err(MaskError::NotAnonymisable { groups: failures });
        }

        let mut grid = BinaryMatrix::zeros(spec.rows, spec.cols);
        let mut cleared = BinaryMatrix::zeros(spec.rows, spec.cols);
        for i in 0..source.rows() {
            for j in 0..source.cols() {
                let (ai, aj) = spec.crop.to_aligned((i, j));
                match (source.get(i, j), working.get(i, j)) {
                    (false, true) => grid.set(ai, aj, true),
                    (true, false) => cleared.set(ai, aj, true),
                    _ => {}
                }
            }
        }
        spec.replicate(&mut grid);
        spec.replicate(&mut cleared);
        debug!(
            "{}: strategic mask adds {} dot(s), supersedes {}",
            spec.id,
            grid.count_ones(),
            cleared.count_ones()
        );

        Ok(Mask {
            pattern: spec.id,
            policy: MaskPolicy::Strategic,
            grid,
            cleared,
        })
    }
}

fn full_mask(tdm: &TrackingDotMatrix) -> Mask {
    let spec = tdm.spec();
    let mut grid = BinaryMatrix::zeros(spec.rows, spec.cols);
    for (i, j) in spec.structural_cells() {
        grid.set(i, j, true);
    }
    for (i, j) in tdm.aligned().ones() {
        grid.set(i, j, false);
    }
    spec.replicate(&mut grid);
    debug!("{}: full mask adds {} dot(s)", spec.id, grid.count_ones());
    Mask {
        pattern: spec.id,
        policy: MaskPolicy::Full,
        grid,
        cleared: BinaryMatrix::zeros(spec.rows, spec.cols),
    }
}

fn label(field: &FieldSpec, k: usize) -> String {
    format!("{}[{}]", field.name, k)
}

/// Replace every one-hot word with another slot. Returns the groups left
/// without an alternative.
fn one_hot_slots(
    spec: &PatternSpec,
    working: &mut BinaryMatrix,
    rng: &mut StdRng,
    spoof: bool,
) -> Vec<String> {
    let mut failures = Vec::new();
    for field in &spec.fields {
        let done = match &field.codec {
            FieldCodec::Manufacturer { table } if spoof => {
                spoof_manufacturer(*table, &field.words, working, rng)
            }
            FieldCodec::DigitTable { table, .. } => {
                replace_digit_pairs(field, *table, working, rng, &mut failures);
                true
            }
            _ => false,
        };
        if done {
            continue;
        }
        for (k, word) in field.words.iter().enumerate() {
            let current = word.one_hot(working);
            let options: Vec<usize> = (0..word.len)
                .filter(|&idx| {
                    let (i, j) = word.cell(idx);
                    Some(idx) != current && !working.get(i, j)
                })
                .collect();
            match options.choose(rng) {
                Some(&idx) => word.write_one_hot(working, idx),
                None => failures.push(label(field, k)),
            }
        }
    }
    failures
}

/// Write a known code whose digits all differ from the current ones.
fn spoof_manufacturer(
    table: VendorTable,
    words: &[Word],
    working: &mut BinaryMatrix,
    rng: &mut StdRng,
) -> bool {
    let current: Vec<Option<usize>> = words.iter().map(|w| w.one_hot(working)).collect();
    let options: Vec<Vec<usize>> = table
        .iter()
        .filter_map(|(code, _)| {
            let digits: Vec<usize> = code
                .chars()
                .map(|c| c.to_digit(10).map(|d| d as usize))
                .collect::<Option<_>>()?;
            let fits = digits.len() == words.len()
                && digits
                    .iter()
                    .zip(words.iter().zip(&current))
                    .all(|(&d, (w, &cur))| d < w.len && Some(d) != cur);
            fits.then_some(digits)
        })
        .collect();
    let Some(digits) = options.choose(rng) else {
        debug!("no manufacturer code differs in every digit; replacing slots individually");
        return false;
    };
    for (word, &d) in words.iter().zip(digits) {
        word.write_one_hot(working, d);
    }
    true
}

/// Swap each digit pair for a table entry using two fresh slots.
fn replace_digit_pairs(
    field: &FieldSpec,
    table: DigitTable,
    working: &mut BinaryMatrix,
    rng: &mut StdRng,
    failures: &mut Vec<String>,
) {
    for (k, pair) in field.words.chunks(2).enumerate() {
        let [hi, lo] = pair else {
            failures.push(label(field, k));
            continue;
        };
        let current = (hi.one_hot(working), lo.one_hot(working));
        let options: Vec<&str> = table
            .iter()
            .map(|(bits, _)| *bits)
            .filter(|bits| {
                let a = bits.get(..hi.len).and_then(|s| s.find('1'));
                let b = bits.get(hi.len..).and_then(|s| s.find('1'));
                a.is_some() && b.is_some() && a != current.0 && b != current.1
            })
            .collect();
        match options.choose(rng) {
            Some(bits) => {
                hi.write_bits(working, bits);
                lo.write_bits(working, &bits[hi.len..]);
            }
            None => failures.push(label(field, k)),
        }
    }
}

/// Attempts at covering every data word before giving up on a tile.
const COVER_ATTEMPTS: usize = 32;

/// Free data cells seen as a bipartite graph between lines and positions.
///
/// A set of added cells keeps every line and position parity exactly when
/// each vertex touches an even number of them, that is when the set is a
/// union of cycles. A cell lies on some cycle unless it is a bridge.
struct FreeCells {
    /// Cropped cell of each edge.
    cells: Vec<Cell>,
    /// `(line vertex, position vertex)` of each edge.
    ends: Vec<(usize, usize)>,
    /// `(neighbour, edge)` per vertex; lines first, then positions.
    adj: Vec<Vec<(usize, usize)>>,
}

impl FreeCells {
    fn new(working: &BinaryMatrix, axis: Axis, lines: &[usize], positions: &[usize]) -> Self {
        let n_lines = lines.len();
        let mut out = FreeCells {
            cells: Vec::new(),
            ends: Vec::new(),
            adj: vec![Vec::new(); n_lines + positions.len()],
        };
        for (li, &line) in lines.iter().enumerate() {
            for (pi, &pos) in positions.iter().enumerate() {
                let (i, j) = match axis {
                    Axis::Row => (line, pos),
                    Axis::Col => (pos, line),
                };
                if working.get(i, j) {
                    continue;
                }
                let e = out.cells.len();
                let (u, v) = (li, n_lines + pi);
                out.cells.push((i, j));
                out.ends.push((u, v));
                out.adj[u].push((v, e));
                out.adj[v].push((u, e));
            }
        }
        out
    }

    fn edge_of(&self, cell: Cell) -> Option<usize> {
        self.cells.iter().position(|&c| c == cell)
    }

    /// Shortest path between the ends of `edge` avoiding it and every
    /// `blocked` edge, as a list of edges.
    fn detour(
        &self,
        adj: &[Vec<(usize, usize)>],
        edge: usize,
        blocked: &[bool],
    ) -> Option<Vec<usize>> {
        let (from, to) = self.ends[edge];
        let mut prev: Vec<Option<(usize, usize)>> = vec![None; adj.len()];
        let mut seen = vec![false; adj.len()];
        let mut queue = VecDeque::from([from]);
        seen[from] = true;
        while let Some(u) = queue.pop_front() {
            if u == to {
                let mut path = Vec::new();
                let mut at = to;
                while let Some((p, e)) = prev[at] {
                    path.push(e);
                    at = p;
                }
                return Some(path);
            }
            for &(v, e) in &adj[u] {
                if e == edge || blocked[e] || seen[v] {
                    continue;
                }
                seen[v] = true;
                prev[v] = Some((u, e));
                queue.push_back(v);
            }
        }
        None
    }

    fn on_cycle(&self, edge: usize) -> bool {
        let none = vec![false; self.cells.len()];
        self.detour(&self.adj, edge, &none).is_some()
    }
}

/// One data word and the free cells that would change it.
struct WordCover {
    label: String,
    edges: Vec<usize>,
    /// Subset of `edges` that lies on a cycle.
    usable: Vec<usize>,
}

impl WordCover {
    fn hit(&self, chosen: &[bool]) -> bool {
        self.edges.iter().any(|&e| chosen[e])
    }
}

/// Add a union of cycles of free data cells touching every data word.
///
/// Words whose free cells are all bridges cannot change without breaking a
/// parity check and are returned as failures before anything is written.
fn parity_cycles(
    spec: &PatternSpec,
    working: &mut BinaryMatrix,
    rng: &mut StdRng,
    axis: Axis,
    lines: Range<usize>,
    positions: Range<usize>,
) -> Vec<String> {
    let line_ids: Vec<usize> = lines.collect();
    let pos_ids: Vec<usize> = positions.collect();
    let graph = FreeCells::new(working, axis, &line_ids, &pos_ids);

    let mut failures = Vec::new();
    let mut words: Vec<WordCover> = Vec::new();
    for field in &spec.fields {
        for (k, word) in field.words.iter().enumerate() {
            let name = label(field, k);
            if word.axis != axis || !line_ids.contains(&word.line()) {
                failures.push(name);
                continue;
            }
            let edges: Vec<usize> = word.cells().filter_map(|c| graph.edge_of(c)).collect();
            let usable: Vec<usize> = edges
                .iter()
                .copied()
                .filter(|&e| graph.on_cycle(e))
                .collect();
            if usable.is_empty() {
                failures.push(name);
                continue;
            }
            words.push(WordCover {
                label: name,
                edges,
                usable,
            });
        }
    }
    if !failures.is_empty() {
        return failures;
    }

    let mut stuck: Vec<String> = Vec::new();
    for attempt in 0..COVER_ATTEMPTS {
        match cover_words(&graph, &words, rng) {
            Ok(chosen) => {
                for (e, &(i, j)) in graph.cells.iter().enumerate() {
                    if chosen[e] {
                        working.set(i, j, true);
                    }
                }
                debug!("{}: parity cover found on attempt {}", spec.id, attempt + 1);
                return Vec::new();
            }
            Err(w) => {
                let label = &words[w].label;
                if !stuck.contains(label) {
                    stuck.push(label.clone());
                }
            }
        }
    }
    stuck
}

/// One randomised pass: visit words in random order and close a cycle
/// through each word not yet touched. Returns the index of the word that
/// could not be covered.
fn cover_words(
    graph: &FreeCells,
    words: &[WordCover],
    rng: &mut StdRng,
) -> Result<Vec<bool>, usize> {
    let mut adj = graph.adj.clone();
    for list in &mut adj {
        list.shuffle(rng);
    }
    let mut order: Vec<usize> = (0..words.len()).collect();
    order.shuffle(rng);

    let mut chosen = vec![false; graph.cells.len()];
    for &w in &order {
        if words[w].hit(&chosen) {
            continue;
        }
        let mut usable = words[w].usable.clone();
        usable.shuffle(rng);

        // Cycles disjoint from the ones already placed keep every earlier
        // word covered.
        let disjoint = usable
            .iter()
            .find_map(|&e| graph.detour(&adj, e, &chosen).map(|path| (e, path)));
        if let Some((e, path)) = disjoint {
            chosen[e] = true;
            for x in path {
                chosen[x] = true;
            }
            continue;
        }

        let covered: Vec<bool> = words.iter().map(|c| c.hit(&chosen)).collect();
        let none = vec![false; chosen.len()];
        let merged = usable.iter().find_map(|&e| {
            let path = graph.detour(&adj, e, &none)?;
            let mut next = chosen.clone();
            for x in path.into_iter().chain([e]) {
                next[x] = !next[x];
            }
            let keeps = words
                .iter()
                .zip(&covered)
                .all(|(c, &was)| !was || c.hit(&next));
            (keeps && words[w].hit(&next)).then_some(next)
        });
        match merged {
            Some(next) => chosen = next,
            None => return Err(w),
        }
    }
    Ok(chosen)
}
