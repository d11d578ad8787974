//! Integration tests for the sequence controller
//!
//! These tests drive full capture sessions against a scripted in-memory reader
//! and write pages through the real filesystem sink into a temporary folder.

use manga_capture::config::{Config, SeedInput, SelectorConfig, TimingConfig};
use manga_capture::crawler::{
    ConsolePrompt, ElementHandle, Locator, OperatorPrompt, Renderer, SequenceController,
};
use manga_capture::output::{FileSink, SequenceRun};
use manga_capture::state::UnitOutcome;
use manga_capture::{CrawlError, RendererError};
use std::collections::HashMap;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

/// How a scripted page misbehaves
#[derive(Debug, Clone, Copy)]
enum PageFault {
    /// The image is missing for this many attempts, then appears
    Transient(u32),
    /// The image never appears and reloads leave the address unchanged
    Stuck,
    /// The image never appears and every reload lands on a new address
    Drifting,
}

/// One chapter or volume the reader knows about
#[derive(Debug, Clone)]
struct UnitScript {
    page_count: Option<String>,
    ready: bool,
    next_clickable: bool,
    faults: HashMap<u32, PageFault>,
}

impl UnitScript {
    fn pages(total: u32) -> Self {
        Self {
            page_count: Some(total.to_string()),
            ready: true,
            next_clickable: true,
            faults: HashMap::new(),
        }
    }

    fn with_fault(mut self, page: u32, fault: PageFault) -> Self {
        self.faults.insert(page, fault);
        self
    }
}

/// In-memory reader website; unknown addresses render as not-found pages
struct ScriptedRenderer {
    selectors: SelectorConfig,
    units: HashMap<String, UnitScript>,
    current: String,
    page: u32,
    reloads: u32,
    remaining: HashMap<(String, u32), u32>,
    loads: Vec<String>,
    advances: u32,
    captures: Vec<(String, u32)>,
}

impl ScriptedRenderer {
    fn new() -> Self {
        Self {
            selectors: SelectorConfig::default(),
            units: HashMap::new(),
            current: String::new(),
            page: 0,
            reloads: 0,
            remaining: HashMap::new(),
            loads: Vec::new(),
            advances: 0,
            captures: Vec::new(),
        }
    }

    fn unit(mut self, address: &str, script: UnitScript) -> Self {
        self.units.insert(address.to_string(), script);
        self
    }

    fn fault(&self) -> Option<PageFault> {
        self.units
            .get(&self.current)
            .and_then(|unit| unit.faults.get(&self.page).copied())
    }

    fn image_ready(&mut self) -> bool {
        match self.fault() {
            None => true,
            Some(PageFault::Transient(attempts)) => {
                let remaining = self
                    .remaining
                    .entry((self.current.clone(), self.page))
                    .or_insert(attempts);
                *remaining == 0
            }
            Some(PageFault::Stuck) | Some(PageFault::Drifting) => false,
        }
    }
}

impl Renderer for ScriptedRenderer {
    fn load(&mut self, address: &str) -> Result<(), RendererError> {
        self.loads.push(address.to_string());
        self.current = address.to_string();
        self.page = 1;
        Ok(())
    }

    fn is_not_found(&mut self) -> bool {
        !self.units.contains_key(&self.current)
    }

    fn wait_for_element(
        &mut self,
        locator: &Locator,
        _timeout: Duration,
        click: bool,
    ) -> Option<ElementHandle> {
        let unit = self.units.get(&self.current)?.clone();
        let found = |text: &str| Some(ElementHandle::new(locator.clone(), text));

        if Some(locator) == self.selectors.reading_mode.as_ref() {
            return found("Horizontal Follow");
        }
        if *locator == self.selectors.page_count {
            return unit.page_count.as_deref().and_then(found);
        }
        if *locator == self.selectors.container {
            return if unit.ready { found("") } else { None };
        }
        if *locator == self.selectors.image {
            return if unit.ready && self.image_ready() {
                found("")
            } else {
                None
            };
        }
        if *locator == self.selectors.next {
            if !unit.next_clickable {
                return None;
            }
            if click {
                self.page += 1;
                self.advances += 1;
            }
            return found("");
        }
        None
    }

    fn refresh(&mut self) -> Result<(), RendererError> {
        self.reloads += 1;
        if let Some(remaining) = self.remaining.get_mut(&(self.current.clone(), self.page)) {
            *remaining = remaining.saturating_sub(1);
        }
        Ok(())
    }

    fn current_address(&mut self) -> String {
        match self.fault() {
            Some(PageFault::Drifting) => format!("{}?reload={}", self.current, self.reloads),
            _ => self.current.clone(),
        }
    }

    fn capture(&mut self, _element: &ElementHandle) -> Result<Vec<u8>, RendererError> {
        self.captures.push((self.current.clone(), self.page));
        Ok(format!("{}#{}", self.current, self.page).into_bytes())
    }
}

/// Creates a configuration with no delays and no backoff
fn create_test_config() -> Config {
    let mut config = Config::default();
    config.timing = TimingConfig::immediate();
    config.retry.backoff_ms = 0;
    config
}

fn run_session(
    renderer: &mut ScriptedRenderer,
    seed: &str,
    root: &Path,
    prompt: Option<Box<dyn OperatorPrompt>>,
) -> Result<SequenceRun, CrawlError> {
    let config = create_test_config();
    let seed = SeedInput {
        address: seed.to_string(),
        destination_root: root.to_path_buf(),
        window_width: 1450,
        window_height: 1934,
    };

    let mut controller =
        SequenceController::new(seed, &config, renderer, Box::new(FileSink::new()));
    if let Some(prompt) = prompt {
        controller = controller.with_prompt(prompt);
    }
    controller.run()
}

fn page_files(folder: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(folder)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

#[test]
fn test_single_chapter_until_not_found() {
    let dir = TempDir::new().unwrap();
    let mut renderer = ScriptedRenderer::new().unit("https://site/x/chapter-5", UnitScript::pages(3));

    let run = run_session(&mut renderer, "https://site/x/chapter-5", dir.path(), None).unwrap();

    let folder = dir.path().join("chapter-005");
    assert_eq!(page_files(&folder), vec!["001.jpg", "002.jpg", "003.jpg"]);
    assert_eq!(
        fs::read(folder.join("002.jpg")).unwrap(),
        b"https://site/x/chapter-5#2"
    );

    assert_eq!(renderer.advances, 2);
    assert_eq!(
        renderer.loads,
        vec!["https://site/x/chapter-5", "https://site/x/chapter-6"]
    );
    assert_eq!(run.last_outcome, Some(UnitOutcome::NotFound));
    assert!(run.ended_cleanly());
    assert_eq!(run.summary_line(), "Captured 1 chapter.");
}

#[test]
fn test_volume_series() {
    let dir = TempDir::new().unwrap();
    let mut renderer = ScriptedRenderer::new()
        .unit("https://site/x/volume-1", UnitScript::pages(2))
        .unit("https://site/x/volume-2", UnitScript::pages(3));

    let run = run_session(&mut renderer, "https://site/x/volume-1", dir.path(), None).unwrap();

    assert_eq!(
        page_files(&dir.path().join("volume-001")),
        vec!["001.jpg", "002.jpg"]
    );
    assert_eq!(
        page_files(&dir.path().join("volume-002")),
        vec!["001.jpg", "002.jpg", "003.jpg"]
    );
    assert!(!dir.path().join("volume-003").exists());

    assert_eq!(run.units_completed, 2);
    assert_eq!(run.pages_captured, 5);
    assert_eq!(run.stopped_at.as_deref(), Some("https://site/x/volume-3"));
    assert_eq!(run.summary_line(), "Captured 2 volumes.");
}

#[test]
fn test_stops_at_first_missing_unit() {
    let dir = TempDir::new().unwrap();
    let mut renderer = ScriptedRenderer::new();
    for n in 1..=4 {
        renderer = renderer.unit(&format!("https://site/x/chapter-{}", n), UnitScript::pages(1));
    }
    // A later unit exists but is never reached
    renderer = renderer.unit("https://site/x/chapter-6", UnitScript::pages(1));

    let run = run_session(&mut renderer, "https://site/x/chapter-1", dir.path(), None).unwrap();

    assert_eq!(run.units_completed, 4);
    assert_eq!(renderer.loads.len(), 5);
    assert_eq!(renderer.loads[4], "https://site/x/chapter-5");
    assert_eq!(renderer.advances, 0);
    assert!(!dir.path().join("chapter-006").exists());
}

#[test]
fn test_invalid_seed_performs_no_navigation() {
    let dir = TempDir::new().unwrap();
    let mut renderer = ScriptedRenderer::new().unit("https://site/x/episode-1", UnitScript::pages(3));

    let err = run_session(&mut renderer, "https://site/x/episode-1", dir.path(), None).unwrap_err();

    assert!(matches!(err, CrawlError::Address(_)));
    assert!(renderer.loads.is_empty());
    assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[test]
fn test_page_count_failure_keeps_earlier_units() {
    let dir = TempDir::new().unwrap();
    let mut broken = UnitScript::pages(1);
    broken.page_count = Some("loading...".to_string());
    let mut renderer = ScriptedRenderer::new()
        .unit("https://site/x/chapter-1", UnitScript::pages(2))
        .unit("https://site/x/chapter-2", broken);

    let run = run_session(&mut renderer, "https://site/x/chapter-1", dir.path(), None).unwrap();

    assert_eq!(run.last_outcome, Some(UnitOutcome::Error));
    assert_eq!(run.units_completed, 1);
    assert_eq!(
        page_files(&dir.path().join("chapter-001")),
        vec!["001.jpg", "002.jpg"]
    );
    assert!(!dir.path().join("chapter-002").exists());

    let failure = run.last_error.unwrap();
    assert_eq!(failure.address, "https://site/x/chapter-2");
    assert_eq!(failure.page, None);
    assert!(failure.message.contains("loading..."));
}

#[test]
fn test_transient_page_is_recaptured() {
    let dir = TempDir::new().unwrap();
    let mut renderer = ScriptedRenderer::new().unit(
        "https://site/x/chapter-1",
        UnitScript::pages(3).with_fault(2, PageFault::Transient(2)),
    );

    let run = run_session(&mut renderer, "https://site/x/chapter-1", dir.path(), None).unwrap();

    assert_eq!(
        page_files(&dir.path().join("chapter-001")),
        vec!["001.jpg", "002.jpg", "003.jpg"]
    );
    assert_eq!(renderer.reloads, 2);
    assert_eq!(run.pages_captured, 3);
    assert_eq!(run.last_outcome, Some(UnitOutcome::NotFound));
}

#[test]
fn test_stalled_page_is_skipped() {
    let dir = TempDir::new().unwrap();
    let mut renderer = ScriptedRenderer::new().unit(
        "https://site/x/chapter-1",
        UnitScript::pages(3).with_fault(2, PageFault::Stuck),
    );

    let run = run_session(&mut renderer, "https://site/x/chapter-1", dir.path(), None).unwrap();

    assert_eq!(
        page_files(&dir.path().join("chapter-001")),
        vec!["001.jpg", "003.jpg"]
    );
    assert_eq!(renderer.reloads, 3);
    assert_eq!(renderer.advances, 2);
    assert_eq!(run.pages_stalled, 1);
    assert_eq!(run.units_completed, 1);
    assert_eq!(run.last_outcome, Some(UnitOutcome::NotFound));
}

#[test]
fn test_fatal_page_aborts_session() {
    let dir = TempDir::new().unwrap();
    let mut renderer = ScriptedRenderer::new()
        .unit(
            "https://site/x/chapter-1",
            UnitScript::pages(3).with_fault(2, PageFault::Drifting),
        )
        .unit("https://site/x/chapter-2", UnitScript::pages(1));

    let run = run_session(&mut renderer, "https://site/x/chapter-1", dir.path(), None).unwrap();

    assert_eq!(run.last_outcome, Some(UnitOutcome::Error));
    assert_eq!(run.units_completed, 0);
    assert_eq!(renderer.reloads, 5);
    assert_eq!(renderer.loads, vec!["https://site/x/chapter-1"]);
    assert_eq!(page_files(&dir.path().join("chapter-001")), vec!["001.jpg"]);

    let failure = run.last_error.unwrap();
    assert_eq!(failure.page, Some(2));
}

#[test]
fn test_operator_continues_past_fatal_page() {
    let dir = TempDir::new().unwrap();
    let mut renderer = ScriptedRenderer::new().unit(
        "https://site/x/chapter-1",
        UnitScript::pages(3).with_fault(2, PageFault::Drifting),
    );
    let prompt = ConsolePrompt::new(Cursor::new("c\n".to_string()), Vec::new());

    let run = run_session(
        &mut renderer,
        "https://site/x/chapter-1",
        dir.path(),
        Some(Box::new(prompt)),
    )
    .unwrap();

    assert_eq!(
        page_files(&dir.path().join("chapter-001")),
        vec!["001.jpg", "003.jpg"]
    );
    assert_eq!(run.pages_abandoned, 1);
    assert_eq!(run.units_completed, 1);
    assert_eq!(run.last_outcome, Some(UnitOutcome::NotFound));
}

#[test]
fn test_reader_never_ready() {
    let dir = TempDir::new().unwrap();
    let mut stuck = UnitScript::pages(4);
    stuck.ready = false;
    let mut renderer = ScriptedRenderer::new().unit("https://site/x/volume-7", stuck);

    let run = run_session(&mut renderer, "https://site/x/volume-7", dir.path(), None).unwrap();

    assert_eq!(run.last_outcome, Some(UnitOutcome::Error));
    assert!(renderer.captures.is_empty());
    assert_eq!(run.summary_line(), "Captured 0 volumes.");
    assert!(run
        .last_error
        .unwrap()
        .message
        .contains("never showed an active page"));
}

#[test]
fn test_unclickable_next_ends_unit_without_renumbering() {
    let dir = TempDir::new().unwrap();
    let mut broken = UnitScript::pages(3);
    broken.next_clickable = false;
    let mut renderer = ScriptedRenderer::new()
        .unit("https://site/x/chapter-1", broken)
        .unit("https://site/x/chapter-2", UnitScript::pages(1));

    let run = run_session(&mut renderer, "https://site/x/chapter-1", dir.path(), None).unwrap();

    assert_eq!(run.last_outcome, Some(UnitOutcome::Error));
    assert_eq!(run.units_completed, 0);
    assert_eq!(renderer.loads, vec!["https://site/x/chapter-1"]);
    assert_eq!(page_files(&dir.path().join("chapter-001")), vec!["001.jpg"]);

    let failure = run.last_error.unwrap();
    assert_eq!(failure.page, Some(1));
    assert!(failure.message.contains("Next control not actionable"));
}
