//! Whole-project documents: the template a merge writes into.
//!
//! A `ProjectDocument` keeps the full chunk tree of a project so that it can
//! be rendered back after tracks are replaced or removed. Tracks are the
//! direct `<TRACK` children of the `REAPER_PROJECT` root and are addressed by
//! their position among those children.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chunk::{self, fresh_guid, Chunk, Node};
use crate::error::{ApplyError, LoadError, SaveError};
use crate::feedback::{FeedbackCollector, ParseResult};
use crate::model::{BaseTempo, Marker, TempoPoint, TempoShape};
use crate::parser::track_name;
use crate::token::{self, format_number, tokenize};

const ROOT: &str = "REAPER_PROJECT";

/// A track of the template as the matcher sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateTrack {
    pub index: usize,
    pub name: String,
    pub is_folder: bool,
    /// Number of enclosing folders.
    pub depth: usize,
    /// Index of the enclosing folder track.
    pub parent: Option<usize>,
    /// `LOCK` flag set in the file.
    pub locked: bool,
}

/// Folder state of a track from its `ISBUS flag delta` line.
fn folder_delta(track: &Chunk) -> i64 {
    let Some(args) = track.field("ISBUS") else {
        return 0;
    };
    let flag = args.first().and_then(|t| t.as_i64()).unwrap_or(0);
    let delta = args.get(1).and_then(|t| t.as_i64()).unwrap_or(0);
    if flag == 1 {
        1
    } else {
        delta.min(0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectDocument {
    path: Option<PathBuf>,
    root: Chunk,
}

impl ProjectDocument {
    /// Parse project text. Text without a `REAPER_PROJECT` root is wrapped
    /// in one.
    pub fn parse(input: &str) -> ParseResult<Self> {
        let mut collector = FeedbackCollector::new();
        let (nodes, feedback) = chunk::split(input);
        collector.extend(feedback);

        let mut roots = Vec::new();
        let mut loose = Vec::new();
        for node in nodes {
            match node {
                Node::Block(b) if b.is(ROOT) => roots.push(b),
                other => loose.push(other),
            }
        }
        let root = match roots.into_iter().next() {
            Some(root) => root,
            None => Chunk {
                header: format!("{ROOT} 0.1"),
                children: loose,
            },
        };

        ParseResult::new(ProjectDocument { path: None, root }, collector.into_feedback())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<ParseResult<Self>, LoadError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| LoadError::FileUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let text = String::from_utf8_lossy(&bytes);
        let mut result = Self::parse(&text);
        result.value.path = Some(path.to_path_buf());
        debug!(path = %path.display(), tracks = result.value.track_count(), "loaded project document");
        Ok(result)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Directory of the file this document was loaded from.
    pub fn dir(&self) -> Option<&Path> {
        self.path
            .as_deref()
            .and_then(Path::parent)
            .filter(|p| !p.as_os_str().is_empty())
    }

    pub fn root(&self) -> &Chunk {
        &self.root
    }

    pub fn tracks(&self) -> impl Iterator<Item = &Chunk> {
        self.root.blocks_of("TRACK")
    }

    pub fn track_count(&self) -> usize {
        self.tracks().count()
    }

    pub fn track(&self, index: usize) -> Option<&Chunk> {
        self.tracks().nth(index)
    }

    /// Position in `root.children` of the track with the given index.
    fn track_slot(&self, index: usize) -> Option<usize> {
        self.root
            .children
            .iter()
            .enumerate()
            .filter(|(_, n)| matches!(n, Node::Block(b) if b.is("TRACK")))
            .nth(index)
            .map(|(slot, _)| slot)
    }

    /// Replace the track at `index` in place.
    pub fn replace_track(&mut self, index: usize, track: Chunk) -> Result<(), ApplyError> {
        if !track.is("TRACK") {
            return Err(ApplyError::NotATrack(track.kind().to_string()));
        }
        let slot = self.track_slot(index).ok_or(ApplyError::NoSuchTrack(index))?;
        self.root.children[slot] = Node::Block(track);
        Ok(())
    }

    /// Destination view of every track.
    pub fn template_tracks(&self) -> Vec<TemplateTrack> {
        let mut open: Vec<usize> = Vec::new();
        let mut out = Vec::new();

        for (index, track) in self.tracks().enumerate() {
            let delta = folder_delta(track);
            out.push(TemplateTrack {
                index,
                name: track_name(track),
                is_folder: delta > 0,
                depth: open.len(),
                parent: open.last().copied(),
                locked: track
                    .field_i64("LOCK")
                    .is_some_and(|flags| flags & 1 != 0),
            });
            if delta > 0 {
                open.push(index);
            } else {
                for _ in 0..delta.unsigned_abs() {
                    open.pop();
                }
            }
        }
        out
    }

    /// Remove tracks by index.
    ///
    /// Folder structure of the remaining tracks is rebuilt from their
    /// surviving ancestors, and `AUXRECV` source indices are renumbered;
    /// receives from removed tracks are dropped.
    pub fn remove_tracks(&mut self, indices: &BTreeSet<usize>) -> usize {
        if indices.is_empty() {
            return 0;
        }
        let layout = self.template_tracks();

        // Kept ancestors give the new nesting level of each kept track
        let mut new_level = BTreeMap::new();
        for t in layout.iter().filter(|t| !indices.contains(&t.index)) {
            let mut level = 0;
            let mut parent = t.parent;
            while let Some(p) = parent {
                if !indices.contains(&p) {
                    level += 1;
                }
                parent = layout[p].parent;
            }
            new_level.insert(t.index, level as i64);
        }
        let kept: Vec<usize> = new_level.keys().copied().collect();
        let renumber: BTreeMap<usize, usize> =
            kept.iter().enumerate().map(|(new, old)| (*old, new)).collect();

        let mut removed = 0;
        let mut track_index = 0;
        let mut children = Vec::with_capacity(self.root.children.len());
        for node in std::mem::take(&mut self.root.children) {
            let mut track = match node {
                Node::Block(b) if b.is("TRACK") => b,
                other => {
                    children.push(other);
                    continue;
                }
            };
            let index = track_index;
            track_index += 1;
            if indices.contains(&index) {
                removed += 1;
                continue;
            }

            let pos = renumber[&index];
            let level = new_level[&index];
            let next_level = kept.get(pos + 1).map(|n| new_level[n]).unwrap_or(0);
            let delta = next_level - level;
            let isbus = match delta {
                d if d > 0 => "1 1".to_string(),
                0 => "0 0".to_string(),
                d => format!("2 {d}"),
            };
            if track.field_line("ISBUS").is_some() || delta != 0 {
                track.set_field("ISBUS", &isbus);
            }
            remap_receives(&mut track, &renumber);
            children.push(Node::Block(track));
        }
        self.root.children = children;

        debug!(removed, remaining = kept.len(), "removed tracks");
        removed
    }

    /// Ids of every `<POOLEDENV` block in the project.
    pub fn pool_ids(&self) -> BTreeSet<u32> {
        self.root
            .blocks_of("POOLEDENV")
            .filter_map(|b| b.field_i64("ID"))
            .filter(|id| *id >= 0)
            .map(|id| id as u32)
            .collect()
    }

    pub fn pool(&self, id: u32) -> Option<&Chunk> {
        self.root
            .blocks_of("POOLEDENV")
            .find(|b| b.field_i64("ID") == Some(id as i64))
    }

    /// Add a pooled envelope before the first track.
    pub fn add_pool(&mut self, pool: Chunk) {
        self.insert_before_tracks(Node::Block(pool));
    }

    fn insert_before_tracks(&mut self, node: Node) {
        let at = self
            .root
            .children
            .iter()
            .position(|n| matches!(n, Node::Block(b) if b.is("TRACK")))
            .unwrap_or(self.root.children.len());
        self.root.children.insert(at, node);
    }

    pub fn set_base_tempo(&mut self, tempo: &BaseTempo) {
        let args = format!(
            "{} {} {}",
            format_number(tempo.bpm),
            tempo.num,
            tempo.denom
        );
        if self.root.field_line("TEMPO").is_some() {
            self.root.set_field("TEMPO", &args);
        } else {
            self.insert_before_tracks(Node::Line(format!("TEMPO {args}")));
        }
    }

    /// Replace the tempo envelope's points, creating the envelope if needed.
    pub fn set_tempo_map(&mut self, points: &[TempoPoint]) {
        let pt_lines = points.iter().map(|p| {
            let mut line = format!(
                "PT {} {} {}",
                format_number(p.time),
                format_number(p.bpm),
                p.shape.code()
            );
            if let Some(sig) = p.time_sig {
                line.push_str(&format!(" {}", sig.pack()));
            }
            Node::Line(line)
        });

        if let Some(env) = self.root.blocks_mut().find(|b| b.is("TEMPOENVEX")) {
            env.children
                .retain(|n| !matches!(n, Node::Line(l) if token::field_name(l) == Some("PT")));
            let at = env
                .children
                .iter()
                .position(|n| matches!(n, Node::Block(_)))
                .unwrap_or(env.children.len());
            env.children.splice(at..at, pt_lines);
            return;
        }

        let mut env = Chunk::new("TEMPOENVEX");
        env.children.push(Node::Line(format!("EGUID {}", fresh_guid())));
        env.children.extend(
            ["ACT 1 -1", "VIS 1 0 1", "LANEHEIGHT 0 0", "ARM 0"]
                .iter()
                .map(|l| Node::Line(l.to_string())),
        );
        env.children
            .push(Node::Line(format!("DEFSHAPE {} -1 -1", TempoShape::Square.code())));
        env.children.extend(pt_lines);
        self.insert_before_tracks(Node::Block(env));
    }

    /// Highest index used by existing `MARKER` lines.
    pub fn max_marker_index(&self) -> u32 {
        self.root
            .lines()
            .filter(|l| token::field_name(l) == Some("MARKER"))
            .filter_map(|l| tokenize(l).get(1).and_then(|t| t.as_i64()))
            .filter(|i| *i >= 0)
            .max()
            .unwrap_or(0) as u32
    }

    /// Append markers after the existing ones.
    ///
    /// Indices are moved past the highest existing index so region start
    /// and end lines never pair with a template marker.
    pub fn append_markers(&mut self, markers: &[Marker]) {
        let base = self.max_marker_index();
        let at = self
            .root
            .children
            .iter()
            .rposition(|n| matches!(n, Node::Line(l) if token::field_name(l) == Some("MARKER")))
            .map(|i| i + 1);
        let mut lines = Vec::new();
        for m in markers {
            let index = base + m.index;
            let flags = if m.is_region { 1 } else { 0 };
            lines.push(Node::Line(format!(
                "MARKER {} {} {} {} {}",
                index,
                format_number(m.pos),
                token::quote(&m.name),
                flags,
                m.color
            )));
            if m.is_region {
                lines.push(Node::Line(format!(
                    "MARKER {} {} \"\" 1",
                    index,
                    format_number(m.region_end)
                )));
            }
        }
        match at {
            Some(at) => {
                self.root.children.splice(at..at, lines);
            }
            None => {
                for line in lines {
                    self.insert_before_tracks(line);
                }
            }
        }
    }

    pub fn render(&self) -> String {
        self.root.render()
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SaveError> {
        let path = path.as_ref();
        std::fs::write(path, self.render()).map_err(|source| SaveError::FileUnwritable {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Rewrite `AUXRECV src ...` source indices through `renumber`.
fn remap_receives(track: &mut Chunk, renumber: &BTreeMap<usize, usize>) {
    track.children.retain_mut(|node| {
        let Node::Line(line) = node else {
            return true;
        };
        if token::field_name(line) != Some("AUXRECV") {
            return true;
        }
        let toks = tokenize(line);
        let Some(src) = toks.get(1).and_then(|t| t.as_i64()) else {
            return true;
        };
        match renumber.get(&(src.max(0) as usize)) {
            Some(new) => {
                let mut rendered: Vec<String> = toks.iter().map(|t| t.render()).collect();
                rendered[1] = new.to_string();
                *line = rendered.join(" ");
                true
            }
            None => false,
        }
    });
}
