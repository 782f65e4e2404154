//! Push-based pipeline stages over version tokens
//!
//! Stages push values downstream synchronously. Buffering stages (sort,
//! json, last-only) hold their input and release it when the terminal
//! flush propagates through the pipeline after the source is exhausted.

use std::io::Write;

use anyhow::{anyhow, Result};
use verge_semver::{Constraint, Version};

/// A value flowing through the pipeline: a raw token or a parsed version.
#[derive(Debug, Clone)]
pub enum Item {
    Token(String),
    Version(Version),
}

type Downstream<'a> = &'a mut dyn FnMut(Item) -> Result<()>;

/// One pipeline stage.
pub trait Stage {
    fn write(&mut self, item: Item, down: Downstream) -> Result<()>;

    fn flush(&mut self, _down: Downstream) -> Result<()> {
        Ok(())
    }
}

/// An ordered chain of stages ending in an `io::Write` sink.
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new() -> Pipeline {
        Pipeline::default()
    }

    pub fn pipe(&mut self, stage: impl Stage + 'static) {
        self.stages.push(Box::new(stage));
    }

    /// Feed every token through the pipeline, then flush each stage in
    /// order so that buffering stages release downstream.
    pub fn run<'a, I>(&mut self, tokens: I, out: &mut dyn Write) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        for token in tokens {
            feed(&mut self.stages, Item::Token(token.to_string()), out)?;
        }
        drain(&mut self.stages, out)
    }
}

fn feed(stages: &mut [Box<dyn Stage>], item: Item, out: &mut dyn Write) -> Result<()> {
    match stages.split_first_mut() {
        None => sink(item, out),
        Some((head, rest)) => head.write(item, &mut |next| feed(rest, next, out)),
    }
}

fn drain(stages: &mut [Box<dyn Stage>], out: &mut dyn Write) -> Result<()> {
    match stages.split_first_mut() {
        None => Ok(()),
        Some((head, rest)) => {
            head.flush(&mut |next| feed(rest, next, out))?;
            drain(rest, out)
        }
    }
}

fn sink(item: Item, out: &mut dyn Write) -> Result<()> {
    match item {
        Item::Token(token) => out.write_all(token.as_bytes())?,
        Item::Version(version) => out.write_all(version.to_string().as_bytes())?,
    }
    Ok(())
}

/// Parses tokens into versions, skipping invalid tokens or failing on
/// them.
pub struct ParseVersions {
    pub skip_invalid: bool,
}

impl Stage for ParseVersions {
    fn write(&mut self, item: Item, down: Downstream) -> Result<()> {
        match item {
            Item::Token(token) => match Version::parse(&token) {
                Ok(version) => down(Item::Version(version)),
                Err(_) if self.skip_invalid => Ok(()),
                Err(_) => Err(anyhow!("invalid version {token:?}")),
            },
            version => down(version),
        }
    }
}

/// Emits only the tokens that are not valid versions.
pub struct InvalidOnly;

impl Stage for InvalidOnly {
    fn write(&mut self, item: Item, down: Downstream) -> Result<()> {
        match item {
            Item::Token(token) if Version::parse(&token).is_err() => down(Item::Token(token)),
            _ => Ok(()),
        }
    }
}

/// Emits only the versions satisfying a constraint.
pub struct FilterConstraint {
    constraint: Constraint,
}

impl FilterConstraint {
    pub fn new(constraint: Constraint) -> FilterConstraint {
        FilterConstraint { constraint }
    }
}

impl Stage for FilterConstraint {
    fn write(&mut self, item: Item, down: Downstream) -> Result<()> {
        match item {
            Item::Version(version) if self.constraint.check(&version) => {
                down(Item::Version(version))
            }
            Item::Version(_) => Ok(()),
            token => down(token),
        }
    }
}

/// Buffers all versions, releasing them in order on flush.
pub struct SortVersions {
    ascending: bool,
    buffered: Vec<Version>,
}

impl SortVersions {
    pub fn new(ascending: bool) -> SortVersions {
        SortVersions {
            ascending,
            buffered: Vec::new(),
        }
    }
}

impl Stage for SortVersions {
    fn write(&mut self, item: Item, down: Downstream) -> Result<()> {
        match item {
            Item::Version(version) => {
                self.buffered.push(version);
                Ok(())
            }
            token => down(token),
        }
    }

    fn flush(&mut self, down: Downstream) -> Result<()> {
        self.buffered.sort();
        if !self.ascending {
            self.buffered.reverse();
        }
        for version in self.buffered.drain(..) {
            down(Item::Version(version))?;
        }
        Ok(())
    }
}

/// Passes through only the first item.
#[derive(Default)]
pub struct FirstOnly {
    seen: bool,
}

impl Stage for FirstOnly {
    fn write(&mut self, item: Item, down: Downstream) -> Result<()> {
        if self.seen {
            return Ok(());
        }
        self.seen = true;
        down(item)
    }
}

/// Holds the latest item and releases it on flush.
#[derive(Default)]
pub struct LastOnly {
    held: Option<Item>,
}

impl Stage for LastOnly {
    fn write(&mut self, item: Item, _down: Downstream) -> Result<()> {
        self.held = Some(item);
        Ok(())
    }

    fn flush(&mut self, down: Downstream) -> Result<()> {
        match self.held.take() {
            Some(item) => down(item),
            None => Ok(()),
        }
    }
}

/// Buffers all versions and releases them as one JSON array on flush.
#[derive(Default)]
pub struct JsonArray {
    buffered: Vec<Version>,
}

impl Stage for JsonArray {
    fn write(&mut self, item: Item, down: Downstream) -> Result<()> {
        match item {
            Item::Version(version) => {
                self.buffered.push(version);
                Ok(())
            }
            token => down(token),
        }
    }

    fn flush(&mut self, down: Downstream) -> Result<()> {
        let mut blob = serde_json::to_string(&self.buffered)?;
        blob.push('\n');
        self.buffered.clear();
        down(Item::Token(blob))
    }
}

/// Renders versions to their canonical text form.
pub struct RenderVersions;

impl Stage for RenderVersions {
    fn write(&mut self, item: Item, down: Downstream) -> Result<()> {
        match item {
            Item::Version(version) => down(Item::Token(version.to_string())),
            token => down(token),
        }
    }
}

/// Wraps each token with a prefix and suffix.
pub struct Decorate {
    prefix: String,
    suffix: String,
}

impl Decorate {
    pub fn new(prefix: &str, suffix: &str) -> Decorate {
        Decorate {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        }
    }
}

impl Stage for Decorate {
    fn write(&mut self, item: Item, down: Downstream) -> Result<()> {
        match item {
            Item::Token(token) => down(Item::Token(format!(
                "{}{}{}",
                self.prefix, token, self.suffix
            ))),
            version => down(version),
        }
    }
}
