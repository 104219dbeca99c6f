//! End-to-end deletion flows against the in-memory host page.
//!
//! Each test builds a branch listing, drives it through the public sweep API
//! and checks the tally, what the host saw and how long the run took.
//! Time is paused, so settle delays cost nothing but still count.
//!
//! Run with: cargo test --test deletion_flow_test

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use branchsweep::config::{Config, SweepConfig};
use branchsweep::page::memory::{ConfirmButton, DialogShape, Effect, HostFlow, MemoryPage};
use branchsweep::page::{HostPage, PageSignal};
use branchsweep::prompt::Prompter;
use branchsweep::sweep::{
    ensure_injected, scan, Activation, ActivationFlow, Injection, Matcher, Orchestrator,
    OutcomeTally, PageWatcher, RunObserver,
};
use branchsweep::Result;

const DELAY: Duration = Duration::from_millis(1000);

fn sweep_config() -> SweepConfig {
    SweepConfig {
        delete_delay_ms: DELAY.as_millis() as u64,
        dialog_render_delay_ms: 200,
        row_selector: "li.branch-row".to_string(),
        trigger_selector: "button.delete".to_string(),
        name_selector: "a.branch-name".to_string(),
        dialog_selectors: vec!["div.dialog".to_string()],
        confirm_selectors: vec![
            Matcher::css("button.danger"),
            Matcher::css_with_text("button", "Delete"),
        ],
        close_selectors: vec![Matcher::css("button.close")],
        placeholder_name: "(unknown)".to_string(),
    }
}

fn config() -> Config {
    let mut config = Config::default();
    config.sweep = sweep_config();
    config.landmark.selector = "div.branches-header".to_string();
    config
}

fn tally(deleted: usize, errors: usize, skipped: usize) -> OutcomeTally {
    OutcomeTally {
        deleted,
        errors,
        skipped,
    }
}

#[derive(Default)]
struct SettleCounter {
    settles: Mutex<Vec<Duration>>,
}

impl RunObserver for SettleCounter {
    fn settling(&self, delay: Duration) {
        self.settles.lock().unwrap().push(delay);
    }
}

/// Records every prompt and answers confirmations with a fixed value.
struct RecordingPrompter {
    answer: bool,
    notices: Mutex<Vec<String>>,
    confirms: Mutex<Vec<String>>,
}

impl RecordingPrompter {
    fn answering(answer: bool) -> Self {
        Self {
            answer,
            notices: Mutex::new(Vec::new()),
            confirms: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Prompter for RecordingPrompter {
    async fn notify(&self, message: &str) -> Result<()> {
        self.notices.lock().unwrap().push(message.to_string());
        Ok(())
    }

    async fn confirm(&self, message: &str) -> Result<bool> {
        self.confirms.lock().unwrap().push(message.to_string());
        Ok(self.answer)
    }
}

#[tokio::test(start_paused = true)]
async fn immediate_flow_deletes_every_row() {
    let (page, listing) = MemoryPage::branch_listing(&["a", "b", "c"], &[], HostFlow::Immediate);
    let config = sweep_config();
    let job = scan(&page, &config).await.unwrap();
    let observer = SettleCounter::default();

    let result = Orchestrator::new(&page, &config)
        .run_with(&job, &observer)
        .await;

    assert_eq!(result, tally(3, 0, 0));
    assert_eq!(observer.settles.lock().unwrap().len(), 2);
    assert!(listing.rows.iter().all(|r| !page.is_connected(r.row)));
}

#[tokio::test(start_paused = true)]
async fn dialog_without_confirm_counts_as_error() {
    let (page, listing) =
        MemoryPage::branch_listing(&["a", "b", "c"], &[], HostFlow::ConfirmDialog);
    let second = &listing.rows[1];
    page.set_effects(
        second.trigger.unwrap(),
        vec![Effect::OpenDialog {
            row: second.row,
            shape: DialogShape {
                confirm: ConfirmButton::Missing,
                closable: true,
            },
        }],
    );
    let config = sweep_config();
    let job = scan(&page, &config).await.unwrap();

    let result = Orchestrator::new(&page, &config).run(&job).await;

    assert_eq!(result, tally(2, 1, 0));
    assert!(page.is_connected(second.row));
    assert!(!page.is_connected(listing.rows[0].row));
    assert!(!page.is_connected(listing.rows[2].row));
}

#[tokio::test(start_paused = true)]
async fn rejected_confirm_closes_the_dialog() {
    let (page, listing) =
        MemoryPage::branch_listing(&["a", "b", "c"], &[], HostFlow::ConfirmDialog);
    let second = &listing.rows[1];
    page.set_effects(
        second.trigger.unwrap(),
        vec![Effect::OpenDialog {
            row: second.row,
            shape: DialogShape {
                confirm: ConfirmButton::Failing,
                closable: true,
            },
        }],
    );
    let config = sweep_config();
    let job = scan(&page, &config).await.unwrap();

    let result = Orchestrator::new(&page, &config).run(&job).await;

    assert_eq!(result, tally(2, 1, 0));
    assert!(page.is_connected(second.row));
    assert!(page.query_all(None, "div.dialog").await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn dialog_left_open_does_not_shadow_later_rows() {
    let (page, listing) =
        MemoryPage::branch_listing(&["a", "b", "c", "d"], &[], HostFlow::ConfirmDialog);
    let second = &listing.rows[1];
    page.set_effects(
        second.trigger.unwrap(),
        vec![Effect::OpenDialog {
            row: second.row,
            shape: DialogShape {
                confirm: ConfirmButton::Missing,
                closable: false,
            },
        }],
    );
    let config = sweep_config();
    let job = scan(&page, &config).await.unwrap();

    let result = Orchestrator::new(&page, &config).run(&job).await;

    assert_eq!(result, tally(3, 1, 0));
    assert!(!page.is_connected(listing.rows[2].row));
    assert!(!page.is_connected(listing.rows[3].row));
}

#[tokio::test(start_paused = true)]
async fn failed_reload_still_reports_the_run() {
    let (page, _) = MemoryPage::branch_listing(&["a", "b"], &[], HostFlow::ConfirmDialog);
    page.fail_reloads("navigation aborted");
    let config = sweep_config();
    let prompter = RecordingPrompter::answering(true);

    let outcome = ActivationFlow::new(&page, &prompter, &config)
        .activate()
        .await
        .unwrap();

    assert_eq!(outcome, Activation::Completed(tally(2, 0, 0)));
    assert_eq!(prompter.notices.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn row_removed_by_host_is_skipped() {
    let (page, listing) =
        MemoryPage::branch_listing(&["a", "b", "c", "d"], &[], HostFlow::Immediate);
    let config = sweep_config();
    let job = scan(&page, &config).await.unwrap();

    // host re-render drops row 2 while row 1 is being deleted
    let first_trigger = listing.rows[0].trigger.unwrap();
    page.set_effects(
        first_trigger,
        vec![
            Effect::Detach(listing.rows[0].row),
            Effect::Detach(listing.rows[1].row),
        ],
    );

    let result = Orchestrator::new(&page, &config).run(&job).await;

    assert_eq!(result, tally(3, 0, 1));
    assert!(!page
        .activations()
        .contains(&listing.rows[1].trigger.unwrap()));
}

#[tokio::test(start_paused = true)]
async fn tally_always_sums_to_job_size() {
    for n in 1..=6 {
        let names: Vec<String> = (0..n).map(|i| format!("branch-{}", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let (page, listing) = MemoryPage::branch_listing(&refs, &[], HostFlow::ConfirmDialog);

        // mix of failures and skips
        if n > 2 {
            page.set_effects(
                listing.rows[1].trigger.unwrap(),
                vec![Effect::Fail("server error".to_string())],
            );
        }
        let config = sweep_config();
        let job = scan(&page, &config).await.unwrap();
        if n > 3 {
            page.detach(listing.rows[3].row);
        }

        let result = Orchestrator::new(&page, &config).run(&job).await;
        assert_eq!(result.total(), n, "job of {} rows", n);
    }
}

#[tokio::test(start_paused = true)]
async fn inter_row_delay_is_never_skipped() {
    let (page, listing) =
        MemoryPage::branch_listing(&["a", "b", "c", "d"], &[], HostFlow::Immediate);
    page.set_effects(
        listing.rows[2].trigger.unwrap(),
        vec![Effect::Fail("boom".to_string())],
    );
    let config = sweep_config();
    let job = scan(&page, &config).await.unwrap();
    page.detach(listing.rows[1].row);

    let start = Instant::now();
    Orchestrator::new(&page, &config).run(&job).await;

    assert!(start.elapsed() >= DELAY * 3);
}

#[tokio::test(start_paused = true)]
async fn failing_row_does_not_stop_the_run() {
    let (page, listing) =
        MemoryPage::branch_listing(&["a", "b", "c"], &[], HostFlow::ConfirmDialog);
    page.set_effects(
        listing.rows[0].trigger.unwrap(),
        vec![Effect::Fail("trigger threw".to_string())],
    );
    let config = sweep_config();
    let job = scan(&page, &config).await.unwrap();

    let result = Orchestrator::new(&page, &config).run(&job).await;

    assert_eq!(result, tally(2, 1, 0));
}

#[tokio::test]
async fn empty_job_never_prompts_for_confirmation() {
    let (page, _) = MemoryPage::branch_listing(&["main"], &["main"], HostFlow::Immediate);
    let config = sweep_config();
    let prompter = RecordingPrompter::answering(true);

    let outcome = ActivationFlow::new(&page, &prompter, &config)
        .activate()
        .await
        .unwrap();

    assert_eq!(outcome, Activation::NothingToDo);
    assert!(prompter.confirms.lock().unwrap().is_empty());
    let notices = prompter.notices.lock().unwrap();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].to_lowercase().contains("no deletable branches"));
    assert!(page.activations().is_empty());
}

#[tokio::test(start_paused = true)]
async fn confirmed_activation_runs_and_reloads() {
    let (page, _) = MemoryPage::branch_listing(&["main", "a", "b"], &["main"], HostFlow::ConfirmDialog);
    let config = sweep_config();
    let prompter = RecordingPrompter::answering(true);

    let outcome = ActivationFlow::new(&page, &prompter, &config)
        .activate()
        .await
        .unwrap();

    assert_eq!(outcome, Activation::Completed(tally(2, 0, 0)));
    let confirms = prompter.confirms.lock().unwrap();
    assert!(confirms[0].contains('2'));
    assert!(confirms[0].contains("cannot be undone"));
    assert_eq!(page.reload_count(), 1);
}

#[tokio::test]
async fn repeated_injection_keeps_a_single_control() {
    let (page, listing) = MemoryPage::branch_listing(&["a"], &[], HostFlow::Immediate);
    let control = config().control.spec();

    let mut created = 0;
    for _ in 0..10 {
        if ensure_injected(&page, listing.header, &control).await.unwrap() == Injection::Created {
            created += 1;
        }
    }

    assert_eq!(created, 1);
    assert_eq!(page.count_id(&control.id), 1);
}

#[tokio::test]
async fn second_confirm_matcher_is_used_when_first_misses() {
    let page = MemoryPage::new();
    let dialog = page.add_element(None, "div", &["dialog"], None);
    page.add_element(Some(dialog), "button", &["close"], Some("Cancel"));
    let plain = page.add_element(Some(dialog), "button", &[], Some("Delete"));

    let found = branchsweep::sweep::matcher::find_confirm(
        &page,
        dialog,
        &sweep_config().confirm_selectors,
    )
    .await
    .unwrap();

    assert_eq!(found, Some(plain));
}

#[tokio::test(start_paused = true)]
async fn watcher_serves_activation_and_reinjects() {
    let (page, listing) = MemoryPage::branch_listing(&["main", "a", "b"], &["main"], HostFlow::Immediate);
    let config = config();
    let prompter = RecordingPrompter::answering(true);
    let signals = page.signals();

    // stands in for the user clicking the control once it is there
    let clicker = page.add_element(None, "span", &[], None);
    page.set_effects(clicker, vec![Effect::Emit(PageSignal::Activated)]);
    page.click(clicker).unwrap();
    page.close_signals();

    PageWatcher::new(&page, &prompter, &config)
        .watch(signals)
        .await
        .unwrap();

    assert_eq!(page.reload_count(), 1);
    assert!(page.is_connected(listing.rows[0].row));
    assert!(!page.is_connected(listing.rows[1].row));
    assert_eq!(page.count_id(&config.control.id), 1);
    assert!(page
        .query_first(Some(listing.header), &format!("#{}", config.control.id))
        .await
        .unwrap()
        .is_some());
}
