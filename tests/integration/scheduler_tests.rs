use super::*;
use listing_watcher::{CycleOutcome, DedupStore};
use rust_decimal_macros::dec;
use std::time::Duration;

#[tokio::test]
async fn test_dedup_survives_restart() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let listings = vec![listing("a", dec!(150)), listing("b", dec!(250)), listing("c", dec!(100))];
    let products = vec![product("iphone 13", dec!(100), dec!(200))];

    let notifier = RecordingNotifier::default();
    let mut first = build_scheduler(
        test_config(dir.path(), products.clone()),
        FakeSource::new(listings.clone()),
        notifier.clone(),
    )
    .await?;
    first.run_once().await?;
    assert_eq!(notifier.texts().len(), 2);
    drop(first);

    // A fresh process sees the same listings and stays quiet.
    let restarted_notifier = RecordingNotifier::default();
    let mut second = build_scheduler(
        test_config(dir.path(), products),
        FakeSource::new(listings),
        restarted_notifier.clone(),
    )
    .await?;
    let report = second.run_once().await?;

    assert_eq!(report.matches, 0);
    assert!(!report.persisted);
    assert!(restarted_notifier.texts().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_notified_set_only_grows() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let source = FakeSource::new(vec![listing("a", dec!(150))]);
    let page = Arc::clone(&source.listings);
    let notifier = RecordingNotifier::default();
    let mut scheduler = build_scheduler(
        test_config(dir.path(), vec![product("iphone 13", dec!(100), dec!(200))]),
        source,
        notifier.clone(),
    )
    .await?;
    scheduler.start().await;

    scheduler.run_cycle().await?;
    // "a" disappears from the results and "d" shows up.
    *page.lock().unwrap() = vec![listing("d", dec!(120))];
    scheduler.run_cycle().await?;

    let stored = DedupStore::new(dir.path().join("notified_items.json")).load().await;
    assert!(stored.contains("a"));
    assert!(stored.contains("d"));
    assert_eq!(notifier.texts().len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_alert_goes_to_configured_chat() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let notifier = RecordingNotifier::default();
    let mut scheduler = build_scheduler(
        test_config(dir.path(), vec![product("iphone 13", dec!(100), dec!(200))]),
        FakeSource::new(vec![listing("https://www.olx.pl/d/oferta/a.html", dec!(150))]),
        notifier.clone(),
    )
    .await?;

    scheduler.run_once().await?;

    let sent = notifier.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "987654");
    assert_eq!(
        sent[0].1,
        "🎉 Price Alert for *iphone 13*! 🎉\n\n\
         Item: *Listing https://www.olx.pl/d/oferta/a.html*\n\
         Price: *150.00 PLN* (Target: 200.00)\n\
         Platform: OLX\n\
         URL: https://www.olx.pl/d/oferta/a.html"
    );
    Ok(())
}

#[tokio::test]
async fn test_rejected_alert_is_not_retried() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let notifier = RecordingNotifier {
        reject: true,
        ..Default::default()
    };
    let mut scheduler = build_scheduler(
        test_config(dir.path(), vec![product("iphone 13", dec!(100), dec!(200))]),
        FakeSource::new(vec![listing("a", dec!(150))]),
        notifier.clone(),
    )
    .await?;
    scheduler.start().await;

    let first = scheduler.run_cycle().await?;
    let second = scheduler.run_cycle().await?;

    assert_eq!(first.notifications_failed, 1);
    assert_eq!(second.matches, 0);
    assert_eq!(notifier.texts().len(), 1);
    assert_eq!(scheduler.stats().notifications_failed, 1);
    Ok(())
}

#[tokio::test]
async fn test_failing_source_sends_nothing() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut source = FakeSource::new(vec![listing("a", dec!(150))]);
    source.fail = true;
    let notifier = RecordingNotifier::default();
    let mut scheduler = build_scheduler(
        test_config(dir.path(), vec![product("iphone 13", dec!(100), dec!(200))]),
        source,
        notifier.clone(),
    )
    .await?;

    let report = scheduler.run_once().await?;

    assert_eq!(report.outcome, CycleOutcome::Completed);
    assert_eq!(report.listings_seen, 0);
    assert!(notifier.texts().is_empty());
    assert!(!dir.path().join("notified_items.json").exists());
    Ok(())
}

#[tokio::test]
async fn test_unsupported_platform_is_not_searched() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut entry = product("rower", dec!(0), dec!(500));
    entry.platform = Some("allegro".to_string());
    let source = FakeSource::new(vec![listing("a", dec!(150))]);
    let queries = Arc::clone(&source.queries);
    let mut scheduler = build_scheduler(
        test_config(dir.path(), vec![entry, product("iphone 13", dec!(100), dec!(200))]),
        source,
        RecordingNotifier::default(),
    )
    .await?;

    let report = scheduler.run_once().await?;

    assert_eq!(report.products_skipped, 1);
    assert_eq!(*queries.lock().unwrap(), vec!["iphone 13".to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_missing_credentials_keep_loop_alive() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut config = test_config(dir.path(), vec![product("iphone 13", dec!(100), dec!(200))]);
    config.telegram.chat_id = None;
    config.scheduler.check_interval_secs = 1;
    let source = FakeSource::new(vec![listing("a", dec!(150))]);
    let queries = Arc::clone(&source.queries);
    let notifier = RecordingNotifier::default();
    let mut scheduler = build_scheduler(config, source, notifier.clone()).await?;

    scheduler
        .run_until(tokio::time::sleep(Duration::from_millis(1500)))
        .await?;

    assert_eq!(scheduler.stats().cycles_skipped, 2);
    assert!(queries.lock().unwrap().is_empty());
    assert!(notifier.texts().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_fatal_save_error_reports_failure() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "")?;
    let mut config = test_config(dir.path(), vec![product("iphone 13", dec!(100), dec!(200))]);
    config.store.notified_items_file = blocker.join("notified_items.json");
    let notifier = RecordingNotifier::default();
    let mut scheduler = build_scheduler(
        config,
        FakeSource::new(vec![listing("a", dec!(150))]),
        notifier.clone(),
    )
    .await?;

    let result = scheduler.run_until(std::future::pending::<()>()).await;

    assert!(result.is_err());
    let texts = notifier.texts();
    assert_eq!(texts.len(), 2);
    assert!(texts[1].starts_with("Price tracker encountered an error: IO error"));
    Ok(())
}
