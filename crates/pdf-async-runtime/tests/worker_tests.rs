use image::{Rgb, RgbImage};
use pdf_async_runtime::*;
use pdf_stitch::{LayoutMode, Session};
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;

fn write_images(dir: &Path, count: usize) {
    for i in 0..count {
        RgbImage::from_pixel(10, 20, Rgb([i as u8, 0, 0]))
            .save(dir.join(format!("{i:02}.png")))
            .unwrap();
    }
}

/// Next update that is not a session notification
async fn next_update(rx: &mut mpsc::UnboundedReceiver<StitchUpdate>) -> StitchUpdate {
    loop {
        let update = tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .expect("timed out waiting for update")
            .expect("worker stopped");
        if !matches!(update, StitchUpdate::SessionChanged { .. }) {
            return update;
        }
    }
}

async fn load(
    tx: &mpsc::UnboundedSender<StitchCommand>,
    rx: &mut mpsc::UnboundedReceiver<StitchUpdate>,
    dir: &Path,
) -> usize {
    tx.send(StitchCommand::Load {
        inputs: vec![dir.to_path_buf()],
    })
    .unwrap();
    match next_update(rx).await {
        StitchUpdate::Loaded { count, skipped } => {
            assert!(skipped.is_empty());
            count
        }
        other => panic!("unexpected update: {other:?}"),
    }
}

#[tokio::test]
async fn test_load_and_stats() {
    let dir = tempfile::tempdir().unwrap();
    write_images(dir.path(), 3);
    let (tx, mut rx, _task) = spawn_worker(Session::new().into_shared());

    assert_eq!(load(&tx, &mut rx, dir.path()).await, 3);

    tx.send(StitchCommand::SetLayout {
        layout: PageLayoutConfig::new(LayoutMode::DoublePageLeftToRight, true),
    })
    .unwrap();
    match next_update(&mut rx).await {
        StitchUpdate::StatsCalculated { stats } => {
            assert_eq!(stats.output_pages, 2);
            assert_eq!(stats.spreads, 1);
        }
        other => panic!("unexpected update: {other:?}"),
    }
}

#[tokio::test]
async fn test_render_preview() {
    let dir = tempfile::tempdir().unwrap();
    write_images(dir.path(), 2);
    let (tx, mut rx, _task) = spawn_worker(Session::new().into_shared());
    load(&tx, &mut rx, dir.path()).await;

    tx.send(StitchCommand::SetLayout {
        layout: PageLayoutConfig::new(LayoutMode::DoublePageRightToLeft, false),
    })
    .unwrap();
    next_update(&mut rx).await;

    tx.send(StitchCommand::RenderPreview { page_index: 0 }).unwrap();
    match next_update(&mut rx).await {
        StitchUpdate::PreviewRendered {
            page_index,
            page_count,
            width,
            height,
            rgba_data,
        } => {
            assert_eq!((page_index, page_count), (0, 1));
            assert_eq!((width, height), (20, 20));
            assert_eq!(rgba_data.len(), 20 * 20 * 4);
        }
        other => panic!("unexpected update: {other:?}"),
    }

    tx.send(StitchCommand::RenderPreview { page_index: 5 }).unwrap();
    assert!(matches!(next_update(&mut rx).await, StitchUpdate::Error { .. }));
}

#[tokio::test]
async fn test_crop_preview_after_margins() {
    let dir = tempfile::tempdir().unwrap();
    write_images(dir.path(), 1);
    let (tx, mut rx, _task) = spawn_worker(Session::new().into_shared());
    load(&tx, &mut rx, dir.path()).await;

    tx.send(StitchCommand::SetMargins {
        input: MarginInput::new(2, 2, 8, 18),
        scope: MarginScope::All,
    })
    .unwrap();
    tx.send(StitchCommand::RenderCropPreview { index: 0 }).unwrap();

    match next_update(&mut rx).await {
        StitchUpdate::CropPreviewRendered {
            index,
            width,
            height,
            ..
        } => assert_eq!((index, width, height), (0, 10, 20)),
        other => panic!("unexpected update: {other:?}"),
    }
}

#[tokio::test]
async fn test_export_reports_progress_and_completion() {
    let dir = tempfile::tempdir().unwrap();
    write_images(dir.path(), 3);
    let output = dir.path().join("out.pdf");
    let (tx, mut rx, _task) = spawn_worker(Session::new().into_shared());
    load(&tx, &mut rx, dir.path()).await;

    tx.send(StitchCommand::Export {
        options: ExportOptions::default(),
        output_path: output.clone(),
    })
    .unwrap();

    let mut progress = Vec::new();
    loop {
        match next_update(&mut rx).await {
            StitchUpdate::Progress { current, total, .. } => progress.push((current, total)),
            StitchUpdate::ExportComplete { path, page_count } => {
                assert_eq!(path, output);
                assert_eq!(page_count, 3);
                break;
            }
            other => panic!("unexpected update: {other:?}"),
        }
    }
    assert_eq!(progress, vec![(1, 3), (2, 3), (3, 3)]);
    assert!(output.exists());
}

#[tokio::test]
async fn test_empty_export_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.pdf");
    let (tx, mut rx, _task) = spawn_worker(Session::new().into_shared());

    tx.send(StitchCommand::Export {
        options: ExportOptions::default(),
        output_path: output.clone(),
    })
    .unwrap();

    assert!(matches!(next_update(&mut rx).await, StitchUpdate::ExportSkipped));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_export_to_non_pdf_path_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (tx, mut rx, _task) = spawn_worker(Session::new().into_shared());

    tx.send(StitchCommand::Export {
        options: ExportOptions::default(),
        output_path: dir.path().join("out.txt"),
    })
    .unwrap();

    assert!(matches!(next_update(&mut rx).await, StitchUpdate::Error { .. }));
}

#[tokio::test]
async fn test_session_changes_are_forwarded() {
    let dir = tempfile::tempdir().unwrap();
    write_images(dir.path(), 2);
    let (tx, mut rx, _task) = spawn_worker(Session::new().into_shared());

    tx.send(StitchCommand::Sort { key: SortKey::Name }).unwrap();

    let mut saw_sorted = false;
    let mut saw_event = false;
    while !(saw_sorted && saw_event) {
        let update = tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .unwrap()
            .unwrap();
        match update {
            StitchUpdate::Sorted { key } => {
                assert_eq!(key, SortKey::Name);
                saw_sorted = true;
            }
            StitchUpdate::SessionChanged {
                event: SessionEvent::Sorted { key },
            } => {
                assert_eq!(key, SortKey::Name);
                saw_event = true;
            }
            other => panic!("unexpected update: {other:?}"),
        }
    }
}
