//! Media path relinking.
//!
//! Sessions are usually copied around with relative media folders, so a
//! `FILE` reference is looked up in this order: as written (absolute paths
//! only), under the session directory, under the template directory, then by
//! stripping leading path segments one at a time and trying the remainder
//! under the session and template directories.

use std::path::{Path, PathBuf};

use rpp::token::{self, tokenize};
use rpp::{Chunk, Node};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct MediaResolver {
    template_dir: Option<PathBuf>,
}

impl MediaResolver {
    pub fn new(template_dir: Option<PathBuf>) -> Self {
        Self { template_dir }
    }

    /// Find an existing file for `reference`.
    pub fn resolve(&self, reference: &str, session_dir: Option<&Path>) -> Option<PathBuf> {
        let as_written = Path::new(reference);
        if as_written.is_absolute() && as_written.is_file() {
            return Some(as_written.to_path_buf());
        }

        let roots: Vec<&Path> = [session_dir, self.template_dir.as_deref()]
            .into_iter()
            .flatten()
            .collect();

        let segments: Vec<&str> = reference
            .split(|c: char| c == '/' || c == '\\')
            .filter(|s| !s.is_empty() && *s != ".")
            .collect();
        if segments.is_empty() {
            return None;
        }

        if !as_written.is_absolute() {
            let relative: PathBuf = segments.iter().collect();
            for root in &roots {
                let candidate = root.join(&relative);
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
        }

        // Progressive suffix search: drop leading segments one at a time
        for start in 1..segments.len() {
            let suffix: PathBuf = segments[start..].iter().collect();
            for root in &roots {
                let candidate = root.join(&suffix);
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
        }
        None
    }
}

/// Rewrite every `FILE` reference in `chunk` that resolves to a different
/// path. Returns the references that could not be found; they are left as
/// they were.
pub fn relink_media(chunk: &mut Chunk, session_dir: Option<&Path>, resolver: &MediaResolver) -> Vec<String> {
    let mut unresolved = Vec::new();
    relink_in(chunk, session_dir, resolver, &mut unresolved);
    unresolved
}

fn relink_in(chunk: &mut Chunk, session_dir: Option<&Path>, resolver: &MediaResolver, unresolved: &mut Vec<String>) {
    for node in chunk.children.iter_mut() {
        match node {
            Node::Block(b) => relink_in(b, session_dir, resolver, unresolved),
            Node::Line(line) if token::field_name(line) == Some("FILE") => {
                let toks = tokenize(line);
                let Some(reference) = toks.get(1).map(|t| t.text.to_string()) else {
                    continue;
                };
                match resolver.resolve(&reference, session_dir) {
                    Some(found) => {
                        let found = found.display().to_string();
                        if found != reference {
                            debug!(from = %reference, to = %found, "relinked media");
                            let mut rendered: Vec<String> = toks.iter().map(|t| t.render()).collect();
                            rendered[1] = token::quote(&found);
                            *line = rendered.join(" ");
                        }
                    }
                    None => {
                        warn!(reference = %reference, "media file not found, keeping reference");
                        unresolved.push(reference);
                    }
                }
            }
            Node::Line(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"RIFF").unwrap();
    }

    #[test]
    fn test_relative_to_session_first() {
        let session = tempfile::tempdir().unwrap();
        let template = tempfile::tempdir().unwrap();
        touch(&session.path().join("Media/kick.wav"));
        touch(&template.path().join("Media/kick.wav"));

        let resolver = MediaResolver::new(Some(template.path().to_path_buf()));
        let found = resolver.resolve("Media/kick.wav", Some(session.path()));
        assert_eq!(found, Some(session.path().join("Media/kick.wav")));
    }

    #[test]
    fn test_falls_back_to_template_dir() {
        let template = tempfile::tempdir().unwrap();
        touch(&template.path().join("Media/snare.wav"));

        let resolver = MediaResolver::new(Some(template.path().to_path_buf()));
        let found = resolver.resolve("Media/snare.wav", Some(Path::new("/nonexistent/session")));
        assert_eq!(found, Some(template.path().join("Media/snare.wav")));
    }

    #[test]
    fn test_suffix_search_for_stale_absolute_path() {
        let session = tempfile::tempdir().unwrap();
        touch(&session.path().join("Audio/gtr.wav"));

        let resolver = MediaResolver::default();
        let found = resolver.resolve("/Volumes/Old Drive/Project/Audio/gtr.wav", Some(session.path()));
        assert_eq!(found, Some(session.path().join("Audio/gtr.wav")));

        let found = resolver.resolve("C:\\Sessions\\Take\\Audio\\gtr.wav", Some(session.path()));
        assert_eq!(found, Some(session.path().join("Audio/gtr.wav")));
    }

    #[test]
    fn test_relink_rewrites_and_reports() {
        let session = tempfile::tempdir().unwrap();
        touch(&session.path().join("Media/kick.wav"));

        let (nodes, _) = rpp::chunk::split(
            "<TRACK\n<ITEM\n<SOURCE WAVE\nFILE \"Media/kick.wav\" 1\n>\n>\n<ITEM\n<SOURCE WAVE\nFILE \"gone.wav\"\n>\n>\n>",
        );
        let Some(Node::Block(mut track)) = nodes.into_iter().next() else {
            panic!("expected track");
        };

        let unresolved = relink_media(&mut track, Some(session.path()), &MediaResolver::default());
        assert_eq!(unresolved, vec!["gone.wav".to_string()]);

        let rendered = track.render();
        let expected = format!("FILE \"{}\" 1", session.path().join("Media/kick.wav").display());
        assert!(rendered.contains(&expected), "{rendered}");
        assert!(rendered.contains("FILE \"gone.wav\""));
    }
}
