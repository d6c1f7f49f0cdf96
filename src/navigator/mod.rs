//! Interactive browse-and-select over a local or remote tree.
//!
//! [`Navigator`] is the state machine (cursor, ancestor history, current
//! listing); [`navigate`] drives it from a [`Prompt`]. Listing goes
//! through a [`Lister`] so the same loop serves local folders and rclone
//! remotes.

use crate::console::{Prompt, dim, error_line, heading, parse_index_list};
use crate::error::Error;
use crate::model::{DirectoryEntry, PathRef, SelectedEntry, Selection};

pub(crate) mod local;

pub(crate) trait Lister {
    fn list(&self, at: &PathRef) -> Result<Vec<DirectoryEntry>, Error>;

    /// Must succeed when the folder already exists.
    fn create_dir(&self, at: &PathRef) -> Result<(), Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PickMode {
    /// Files or folders, one or several, as transfer sources.
    Entries,
    /// A single folder, as a destination.
    Directory,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct NavOptions {
    pub(crate) mode: PickMode,
    pub(crate) allow_create: bool,
}

impl NavOptions {
    pub(crate) fn sources() -> Self {
        Self {
            mode: PickMode::Entries,
            allow_create: false,
        }
    }

    pub(crate) fn destination() -> Self {
        Self {
            mode: PickMode::Directory,
            allow_create: true,
        }
    }

    pub(crate) fn existing_directory() -> Self {
        Self {
            mode: PickMode::Directory,
            allow_create: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Input {
    /// One index: descend into a folder, or pick a file.
    Open(usize),
    /// Several indices (or one with a trailing comma): pick as-is.
    Pick(Vec<usize>),
    Ascend,
    SelectCurrent,
    CreateFolder,
}

pub(crate) fn parse_input(line: &str, len: usize, options: NavOptions) -> Result<Input, Error> {
    let trimmed = line.trim();
    match trimmed.to_lowercase().as_str() {
        ".." | "b" => return Ok(Input::Ascend),
        "." | "d" | "select" => return Ok(Input::SelectCurrent),
        "n" if options.allow_create => return Ok(Input::CreateFolder),
        "" => return Err(Error::InvalidUserInput("empty command".to_string())),
        _ => {}
    }
    let indices = parse_index_list(trimmed, len)?;
    if indices.len() == 1 && !trimmed.contains(',') {
        Ok(Input::Open(indices[0]))
    } else {
        Ok(Input::Pick(indices))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Step {
    Browsing,
    NeedFolderName,
    Done(Selection),
}

#[derive(Debug)]
pub(crate) struct Navigator {
    root: PathRef,
    cursor: PathRef,
    history: Vec<PathRef>,
    listing: Vec<DirectoryEntry>,
    options: NavOptions,
}

impl Navigator {
    pub(crate) fn open(
        start: PathRef,
        lister: &dyn Lister,
        options: NavOptions,
    ) -> Result<Self, Error> {
        let listing = lister.list(&start)?;
        Ok(Self {
            root: start.clone(),
            cursor: start,
            history: vec![],
            listing,
            options,
        })
    }

    pub(crate) fn listing(&self) -> &[DirectoryEntry] {
        &self.listing
    }

    /// A failed listing leaves cursor and history where they were.
    pub(crate) fn apply(&mut self, input: Input, lister: &dyn Lister) -> Result<Step, Error> {
        match input {
            Input::Ascend => {
                if let Some(parent) = self.history.last().cloned() {
                    let listing = lister.list(&parent)?;
                    self.history.pop();
                    self.cursor = parent;
                    self.listing = listing;
                }
                Ok(Step::Browsing)
            }
            Input::SelectCurrent => Ok(Step::Done(Selection::Location(self.cursor.clone()))),
            Input::CreateFolder if self.options.allow_create => Ok(Step::NeedFolderName),
            Input::CreateFolder => Err(Error::InvalidUserInput(
                "creating folders is not available here".to_string(),
            )),
            Input::Open(index) => {
                let entry = self.entry(index)?.clone();
                if entry.is_dir() {
                    let target = self.cursor.join(&entry.name);
                    let listing = lister.list(&target)?;
                    let previous = std::mem::replace(&mut self.cursor, target);
                    self.history.push(previous);
                    self.listing = listing;
                    return Ok(Step::Browsing);
                }
                if self.options.mode == PickMode::Directory {
                    return Err(Error::InvalidUserInput(format!(
                        "'{}' is a file; pick a folder",
                        entry.name
                    )));
                }
                Ok(Step::Done(self.selection(&[index])))
            }
            Input::Pick(indices) => {
                for index in &indices {
                    self.entry(*index)?;
                }
                if self.options.mode == PickMode::Directory {
                    return Err(Error::InvalidUserInput(
                        "only one destination folder can be chosen".to_string(),
                    ));
                }
                Ok(Step::Done(self.selection(&indices)))
            }
        }
    }

    pub(crate) fn create_folder(
        &self,
        name: &str,
        lister: &dyn Lister,
    ) -> Result<Selection, Error> {
        let name = name.trim();
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(Error::InvalidUserInput(format!(
                "'{name}' is not a valid folder name"
            )));
        }
        let target = self.cursor.join(name);
        lister.create_dir(&target)?;
        Ok(Selection::Location(target))
    }

    fn entry(&self, index: usize) -> Result<&DirectoryEntry, Error> {
        self.listing.get(index).ok_or_else(|| {
            Error::InvalidUserInput(format!(
                "{} is out of range (1-{})",
                index + 1,
                self.listing.len()
            ))
        })
    }

    fn selection(&self, indices: &[usize]) -> Selection {
        let entries = indices
            .iter()
            .filter_map(|index| self.listing.get(*index))
            .map(|entry| SelectedEntry {
                name: entry.name.clone(),
                path: self.cursor.join(&entry.name),
                kind: entry.kind,
            })
            .collect();
        Selection::Entries {
            base: self.cursor.clone(),
            entries,
        }
    }

    fn render(&self, prompt: &mut dyn Prompt) {
        prompt.say("");
        let top = if self.cursor == self.root {
            dim(" (top)")
        } else {
            String::new()
        };
        prompt.say(&format!("{} {}{top}", heading("Current location:"), self.cursor));
        if self.listing.is_empty() {
            prompt.say(&dim("-- Empty --"));
        }
        for (index, entry) in self.listing.iter().enumerate() {
            let label = if entry.is_dir() {
                format!("{}/", entry.name)
            } else {
                entry.name.clone()
            };
            prompt.say(&format!("{:>3}. {label}", index + 1));
        }
    }

    fn hint(&self) -> &'static str {
        match (self.options.mode, self.options.allow_create) {
            (PickMode::Entries, _) => {
                "Number to open or pick, 1,2 to pick several, '..' up, '.' select this folder:"
            }
            (PickMode::Directory, true) => {
                "Number to open, '..' up, '.' select this folder, 'n' new folder:"
            }
            (PickMode::Directory, false) => "Number to open, '..' up, '.' select this folder:",
        }
    }
}

#[cfg(test)]
impl Navigator {
    pub(crate) fn root(&self) -> &PathRef {
        &self.root
    }

    pub(crate) fn cursor(&self) -> &PathRef {
        &self.cursor
    }

    pub(crate) fn depth(&self) -> usize {
        self.history.len()
    }
}

/// Browses from `start` until a terminal command. Invalid input and failed
/// listings are reported and re-prompted; only cancellation or a missing
/// tool ends the loop early.
pub(crate) fn navigate(
    prompt: &mut dyn Prompt,
    lister: &dyn Lister,
    start: PathRef,
    options: NavOptions,
) -> Result<Selection, Error> {
    let mut nav = Navigator::open(start, lister, options)?;
    loop {
        nav.render(prompt);
        let line = prompt.ask(nav.hint())?;
        let step = parse_input(&line, nav.listing().len(), options)
            .and_then(|input| nav.apply(input, lister));
        match step {
            Ok(Step::Browsing) => {}
            Ok(Step::Done(selection)) => return Ok(selection),
            Ok(Step::NeedFolderName) => {
                let name = prompt.ask("Name of the new folder:")?;
                match nav.create_folder(&name, lister) {
                    Ok(selection) => return Ok(selection),
                    Err(err) => report(prompt, err)?,
                }
            }
            Err(err) => report(prompt, err)?,
        }
    }
}

fn report(prompt: &mut dyn Prompt, err: Error) -> Result<(), Error> {
    match err {
        Error::Cancelled | Error::ToolNotFound { .. } => Err(err),
        Error::InvalidUserInput(reason) => {
            prompt.say(&error_line(&format!("Invalid choice: {reason}")));
            Ok(())
        }
        other => {
            prompt.say(&error_line(&format!("Could not open that location: {other}")));
            Ok(())
        }
    }
}

#[cfg(test)]
pub(crate) struct MapLister {
    pub(crate) dirs: std::collections::HashMap<String, Vec<DirectoryEntry>>,
    pub(crate) created: std::cell::RefCell<Vec<String>>,
}

#[cfg(test)]
impl MapLister {
    pub(crate) fn new(dirs: &[(&str, Vec<DirectoryEntry>)]) -> Self {
        Self {
            dirs: dirs
                .iter()
                .map(|(path, entries)| (path.to_string(), entries.clone()))
                .collect(),
            created: Default::default(),
        }
    }
}

#[cfg(test)]
impl Lister for MapLister {
    fn list(&self, at: &PathRef) -> Result<Vec<DirectoryEntry>, Error> {
        self.dirs
            .get(&at.to_arg())
            .cloned()
            .ok_or_else(|| Error::ToolInvocationFailed {
                command: format!("rclone lsf {at}"),
                status: "exit status: 3".to_string(),
                stderr: "directory not found".to_string(),
            })
    }

    fn create_dir(&self, at: &PathRef) -> Result<(), Error> {
        self.created.borrow_mut().push(at.to_arg());
        Ok(())
    }
}
