//! Session and template files written into a temporary directory.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub const TEMPLATE: &str = r#"<REAPER_PROJECT 0.1 "7.07/linux-x86_64" 1718000000
  TEMPO 90 4 4
  MARKER 1 0 "Start" 0 0
  <TRACK {00000000-0000-0000-0000-000000000001}
    NAME "Drums"
    ISBUS 1 1
  >
  <TRACK {00000000-0000-0000-0000-000000000002}
    NAME "Kick"
    VOLPAN 0.8 0 -1 -1 1
    GROUP_FLAGS 1 0 0 0 0 0 0 0
    <FXCHAIN
      SHOW 0
      DOCKED 0
    >
  >
  <TRACK {00000000-0000-0000-0000-000000000003}
    NAME "Snare"
    ISBUS 2 -1
  >
  <TRACK {00000000-0000-0000-0000-000000000004}
    NAME "Bass"
  >
>
"#;

/// An eight-measure take at 120 BPM 4/4.
pub fn take(name: &str) -> String {
    format!(
        r#"<REAPER_PROJECT 0.1 "7.07/linux-x86_64" 1718000000
  TEMPO 120 4 4
  MARKER 1 4 "{name} chorus" 0 0
  <TRACK
    NAME "Kick In"
    <ITEM
      POSITION 0
      LENGTH 16
      IGUID {{{name}-KICK}}
      <SOURCE WAVE
        FILE "Media/kick.wav"
      >
    >
  >
  <TRACK
    NAME "Snare Top"
    <ITEM
      POSITION 0.5
      LENGTH 15.5
      <SOURCE WAVE
        FILE "Media/snare.wav"
      >
    >
  >
>
"#
    )
}

pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    pub fn template(&self) -> PathBuf {
        self.write("template/band.rpp", TEMPLATE)
    }

    /// A take in its own folder, with its media next to it.
    pub fn take(&self, name: &str) -> PathBuf {
        self.write(&format!("{name}/Media/kick.wav"), "RIFF");
        self.write(&format!("{name}/Media/snare.wav"), "RIFF");
        self.write(&format!("{name}/{name}.rpp"), &take(name))
    }
}
