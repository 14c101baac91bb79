mod common;

use common::{FakePlatform, ScriptedPrompt, resolver, write_cache};
use cpmtool_device::{
    ANDROID_FALLBACK_NAME, CommandOutput, DeviceCache, DeviceError, DeviceResolver,
    MAX_PROMPT_ATTEMPTS, OsFamily, UNKNOWN_DEVICE_NAME,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tempfile::TempDir;

fn cache_path(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join("device_token.json")
}

// ── Cache hits ───────────────────────────────────────────────────

#[tokio::test]
async fn cached_name_returned_without_probing() {
    let dir = TempDir::new().unwrap();
    let path = cache_path(&dir);
    write_cache(&path, r#"{"device_name": "My PC"}"#);

    let platform = Arc::new(FakePlatform::desktop(OsFamily::Linux).with_hostname("other"));
    let resolver = resolver(&path, platform.clone());

    let name = resolver.resolve().await.unwrap();
    assert_eq!(name.as_str(), "My PC");
    assert_eq!(platform.call_count(), 0);
}

#[tokio::test]
async fn cached_localhost_is_a_miss() {
    let dir = TempDir::new().unwrap();
    let path = cache_path(&dir);
    write_cache(&path, r#"{"device_name": "localhost"}"#);

    let platform = Arc::new(FakePlatform::desktop(OsFamily::Linux).with_hostname("workstation"));
    let name = resolver(&path, platform.clone()).resolve().await.unwrap();

    assert_eq!(name.as_str(), "workstation");
    assert_eq!(platform.call_count(), 1);
}

#[tokio::test]
async fn malformed_cache_is_a_miss() {
    let dir = TempDir::new().unwrap();
    let path = cache_path(&dir);
    write_cache(&path, "{not json");

    let platform = Arc::new(FakePlatform::desktop(OsFamily::Linux).with_hostname("workstation"));
    let name = resolver(&path, platform).resolve().await.unwrap();
    assert_eq!(name.as_str(), "workstation");
}

// ── Idempotence ──────────────────────────────────────────────────

#[tokio::test]
async fn resolve_is_idempotent_within_process() {
    let dir = TempDir::new().unwrap();
    let platform = Arc::new(FakePlatform::desktop(OsFamily::Linux).with_hostname("box"));
    let resolver = resolver(&cache_path(&dir), platform.clone());

    let first = resolver.resolve().await.unwrap();
    let second = resolver.resolve().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(platform.call_count(), 1);
    assert_eq!(resolver.cached(), Some(&first));
}

#[tokio::test]
async fn resolve_is_idempotent_across_processes() {
    let dir = TempDir::new().unwrap();
    let path = cache_path(&dir);

    let first_platform = Arc::new(FakePlatform::desktop(OsFamily::Linux).with_hostname("box"));
    let first = resolver(&path, first_platform).resolve().await.unwrap();

    // A fresh resolver sees the cache file the first one wrote.
    let second_platform = Arc::new(FakePlatform::desktop(OsFamily::Linux).with_hostname("changed"));
    let second = resolver(&path, second_platform.clone()).resolve().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(second_platform.call_count(), 0);
}

#[tokio::test]
async fn cached_is_empty_before_resolution() {
    let dir = TempDir::new().unwrap();
    let platform = Arc::new(FakePlatform::desktop(OsFamily::Linux));
    let resolver = resolver(&cache_path(&dir), platform.clone());
    assert!(resolver.cached().is_none());
    assert_eq!(platform.call_count(), 0);
}

// ── Desktop probes ───────────────────────────────────────────────

#[tokio::test]
async fn linux_uses_hostname_and_persists_it() {
    let dir = TempDir::new().unwrap();
    let path = cache_path(&dir);
    let platform = Arc::new(FakePlatform::desktop(OsFamily::Linux).with_hostname("devbox\n"));

    let name = resolver(&path, platform).resolve().await.unwrap();
    assert_eq!(name.as_str(), "devbox");

    let saved = std::fs::read_to_string(&path).unwrap();
    assert_eq!(saved, r#"{"device_name":"devbox"}"#);
}

#[tokio::test]
async fn windows_takes_second_wmic_line() {
    let dir = TempDir::new().unwrap();
    let platform = Arc::new(FakePlatform::desktop(OsFamily::Windows).with_output(
        "wmic computersystem get model",
        CommandOutput::ok("Model  \r\nThinkPad X1 Carbon  \r\n\r\n"),
    ));

    let name = resolver(&cache_path(&dir), platform).resolve().await.unwrap();
    assert_eq!(name.as_str(), "ThinkPad X1 Carbon");
}

#[tokio::test]
async fn windows_without_model_row_prompts() {
    let dir = TempDir::new().unwrap();
    let platform = Arc::new(
        FakePlatform::desktop(OsFamily::Windows)
            .with_output("wmic computersystem get model", CommandOutput::ok("Model")),
    );

    let name = resolver(&cache_path(&dir), platform).resolve().await.unwrap();
    assert_eq!(name.as_str(), "Manual Device");
}

#[tokio::test]
async fn macos_uses_computer_name() {
    let dir = TempDir::new().unwrap();
    let platform = Arc::new(FakePlatform::desktop(OsFamily::MacOs).with_output(
        "scutil --get ComputerName",
        CommandOutput::ok("Ana's MacBook Pro\n"),
    ));

    let name = resolver(&cache_path(&dir), platform).resolve().await.unwrap();
    assert_eq!(name.as_str(), "Ana's MacBook Pro");
}

#[tokio::test]
async fn failed_command_falls_back_to_prompt() {
    let dir = TempDir::new().unwrap();
    let path = cache_path(&dir);
    let platform = Arc::new(FakePlatform::desktop(OsFamily::MacOs).with_output(
        "scutil --get ComputerName",
        CommandOutput {
            success: false,
            status: "exit status: 1".to_string(),
            stdout: "Some Name".to_string(),
        },
    ));

    let name = resolver(&path, platform).resolve().await.unwrap();
    assert_eq!(name.as_str(), "Manual Device");
    assert_eq!(DeviceCache::new(&path).load(), Some(name));
}

#[tokio::test]
async fn hostname_error_falls_back_to_prompt_and_persists() {
    let dir = TempDir::new().unwrap();
    let path = cache_path(&dir);
    let platform = Arc::new(FakePlatform::desktop(OsFamily::Linux));

    let name = resolver(&path, platform).resolve().await.unwrap();
    assert_eq!(name.as_str(), "Manual Device");
    assert_eq!(DeviceCache::new(&path).load().unwrap().as_str(), "Manual Device");
}

#[tokio::test]
async fn localhost_hostname_forces_prompt() {
    let dir = TempDir::new().unwrap();
    let path = cache_path(&dir);
    let platform = Arc::new(FakePlatform::desktop(OsFamily::Linux).with_hostname("localhost"));
    let prompt = Arc::new(ScriptedPrompt::new(&["Garage PC"]));

    let resolver = DeviceResolver::with_parts(DeviceCache::new(&path), platform, prompt.clone());
    let name = resolver.resolve().await.unwrap();

    assert_eq!(name.as_str(), "Garage PC");
    assert_eq!(prompt.asked(), 1);
    let saved = std::fs::read_to_string(&path).unwrap();
    assert!(!saved.contains("localhost"));
}

#[tokio::test]
async fn unknown_os_uses_fixed_name() {
    let dir = TempDir::new().unwrap();
    let platform = Arc::new(FakePlatform::desktop(OsFamily::Other));

    let name = resolver(&cache_path(&dir), platform.clone()).resolve().await.unwrap();
    assert_eq!(name.as_str(), UNKNOWN_DEVICE_NAME);
    assert_eq!(platform.call_count(), 0);
}

// ── Android probes ───────────────────────────────────────────────

#[tokio::test]
async fn android_composes_brand_and_model() {
    let dir = TempDir::new().unwrap();
    let platform = Arc::new(
        FakePlatform::android()
            .with_output("getprop ro.product.model", CommandOutput::ok("SM-G991B\n"))
            .with_output("getprop ro.product.brand", CommandOutput::ok("samsung\n")),
    );

    let name = resolver(&cache_path(&dir), platform).resolve().await.unwrap();
    assert_eq!(name.as_str(), "samsung SM-G991B");
}

#[tokio::test]
async fn android_brand_only() {
    let dir = TempDir::new().unwrap();
    let platform = Arc::new(
        FakePlatform::android().with_output("getprop ro.product.brand", CommandOutput::ok("Acme")),
    );

    let name = resolver(&cache_path(&dir), platform).resolve().await.unwrap();
    assert_eq!(name.as_str(), "Acme");
}

#[tokio::test]
async fn android_without_properties_uses_fallback_not_prompt() {
    let dir = TempDir::new().unwrap();
    let platform = Arc::new(FakePlatform::android());
    let prompt = Arc::new(ScriptedPrompt::new(&[]));

    let resolver = DeviceResolver::with_parts(
        DeviceCache::new(cache_path(&dir)),
        platform.clone(),
        prompt.clone(),
    );
    let name = resolver.resolve().await.unwrap();

    assert_eq!(name.as_str(), ANDROID_FALLBACK_NAME);
    assert_eq!(prompt.asked(), 0);
    // Every property is tried even though each one fails.
    assert_eq!(platform.call_count(), 6);
}

#[tokio::test]
async fn android_first_value_per_kind_wins() {
    let dir = TempDir::new().unwrap();
    let platform = Arc::new(
        FakePlatform::android()
            .with_output("getprop ro.product.device", CommandOutput::ok("beyond1"))
            .with_output("getprop ro.product.name", CommandOutput::ok("beyond1ltexx"))
            .with_output("getprop ro.product.manufacturer", CommandOutput::ok("Samsung")),
    );

    let name = resolver(&cache_path(&dir), platform.clone()).resolve().await.unwrap();
    assert_eq!(name.as_str(), "Samsung beyond1");

    // The trailing model probe is skipped once `device` filled the slot.
    assert_eq!(platform.call_count(), 5);
}

#[tokio::test]
async fn android_product_name_alone_is_ignored() {
    let dir = TempDir::new().unwrap();
    let platform = Arc::new(
        FakePlatform::android()
            .with_output("getprop ro.product.name", CommandOutput::ok("beyond1ltexx\n")),
    );

    let name = resolver(&cache_path(&dir), platform.clone()).resolve().await.unwrap();
    assert_eq!(name.as_str(), ANDROID_FALLBACK_NAME);
    assert!(
        platform
            .commands()
            .contains(&"getprop ro.product.name".to_string())
    );
}

#[tokio::test]
async fn android_blank_output_is_ignored() {
    let dir = TempDir::new().unwrap();
    let platform = Arc::new(
        FakePlatform::android()
            .with_output("getprop ro.product.model", CommandOutput::ok("   \n"))
            .with_output("getprop ro.product.device", CommandOutput::ok("walleye")),
    );

    let name = resolver(&cache_path(&dir), platform).resolve().await.unwrap();
    assert_eq!(name.as_str(), "walleye");
}

// ── Manual entry ─────────────────────────────────────────────────

#[tokio::test]
async fn invalid_manual_entries_are_asked_again() {
    let dir = TempDir::new().unwrap();
    let platform = Arc::new(FakePlatform::desktop(OsFamily::Linux));
    let prompt = Arc::new(ScriptedPrompt::new(&["", "localhost", "  Den PC  "]));

    let resolver =
        DeviceResolver::with_parts(DeviceCache::new(cache_path(&dir)), platform, prompt.clone());
    let name = resolver.resolve().await.unwrap();

    assert_eq!(name.as_str(), "Den PC");
    assert_eq!(prompt.asked(), 3);
}

#[tokio::test]
async fn gives_up_after_max_invalid_entries() {
    let dir = TempDir::new().unwrap();
    let path = cache_path(&dir);
    let platform = Arc::new(FakePlatform::desktop(OsFamily::Linux));
    let prompt = Arc::new(ScriptedPrompt::new(&["", "", "", "never asked"]));

    let resolver = DeviceResolver::with_parts(DeviceCache::new(&path), platform, prompt.clone());
    let err = resolver.resolve().await.unwrap_err();

    assert!(matches!(err, DeviceError::InvalidName(n) if n == MAX_PROMPT_ATTEMPTS));
    assert_eq!(prompt.asked(), MAX_PROMPT_ATTEMPTS);
    assert!(!path.exists());
}

#[tokio::test]
async fn prompt_failure_is_reported() {
    let dir = TempDir::new().unwrap();
    let platform = Arc::new(FakePlatform::desktop(OsFamily::Linux));

    let resolver = DeviceResolver::with_parts(
        DeviceCache::new(cache_path(&dir)),
        platform,
        Arc::new(cpmtool_device::NoPrompt),
    );
    let err = resolver.resolve().await.unwrap_err();
    assert!(matches!(err, DeviceError::Prompt(_)));
    assert!(resolver.cached().is_none());
}

#[tokio::test]
async fn unwritable_cache_does_not_fail_resolution() {
    let dir = TempDir::new().unwrap();
    // The cache path is a directory, so writing the file fails.
    let platform = Arc::new(FakePlatform::desktop(OsFamily::Linux).with_hostname("box"));
    let name = resolver(dir.path(), platform).resolve().await.unwrap();
    assert_eq!(name.as_str(), "box");
}
