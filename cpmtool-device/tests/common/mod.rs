//! Shared test doubles for resolver tests.

#![allow(dead_code)]

use async_trait::async_trait;
use cpmtool_device::{
    CommandOutput, DeviceCache, DeviceError, DeviceResolver, DeviceResult, FixedPrompt,
    NamePrompt, OsFamily, Platform,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Scripted platform: every command answer is configured up front.
#[derive(Default)]
pub struct FakePlatform {
    pub android: bool,
    pub os: Option<OsFamily>,
    pub outputs: HashMap<String, CommandOutput>,
    pub hostname: Option<String>,
    pub calls: AtomicUsize,
    pub commands: Mutex<Vec<String>>,
}

impl FakePlatform {
    pub fn android() -> Self {
        Self {
            android: true,
            ..Default::default()
        }
    }

    pub fn desktop(os: OsFamily) -> Self {
        Self {
            os: Some(os),
            ..Default::default()
        }
    }

    pub fn with_output(mut self, command: &str, output: CommandOutput) -> Self {
        self.outputs.insert(command.to_string(), output);
        self
    }

    pub fn with_hostname(mut self, hostname: &str) -> Self {
        self.hostname = Some(hostname.to_string());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl Platform for FakePlatform {
    fn os_family(&self) -> OsFamily {
        self.os.unwrap_or(OsFamily::Linux)
    }

    fn is_android(&self) -> bool {
        self.android
    }

    async fn run(&self, program: &str, args: &[&str]) -> DeviceResult<CommandOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let command = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        self.commands.lock().unwrap().push(command.clone());
        self.outputs
            .get(&command)
            .cloned()
            .ok_or_else(|| DeviceError::Probe(format!("{command}: not found")))
    }

    fn hostname(&self) -> DeviceResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.hostname
            .clone()
            .ok_or_else(|| DeviceError::Probe("hostname unavailable".to_string()))
    }
}

/// Prompt that records how often it was asked and replays answers in order.
pub struct ScriptedPrompt {
    answers: Mutex<Vec<String>>,
    pub asked: AtomicUsize,
}

impl ScriptedPrompt {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().rev().map(|a| a.to_string()).collect()),
            asked: AtomicUsize::new(0),
        }
    }

    pub fn asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NamePrompt for ScriptedPrompt {
    async fn ask(&self, _message: &str) -> DeviceResult<String> {
        self.asked.fetch_add(1, Ordering::SeqCst);
        self.answers
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| DeviceError::Prompt("no more answers".to_string()))
    }
}

pub fn resolver(cache_path: &Path, platform: Arc<FakePlatform>) -> DeviceResolver {
    DeviceResolver::with_parts(
        DeviceCache::new(cache_path),
        platform,
        Arc::new(FixedPrompt("Manual Device".to_string())),
    )
}

pub fn write_cache(path: &Path, json: &str) {
    std::fs::write(path, json).unwrap();
}
