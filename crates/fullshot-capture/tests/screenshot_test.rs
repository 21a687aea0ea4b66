use fullshot_capture::encoder::decode_base64;
use fullshot_capture::platform::fake::{PaintOutcome, Scenario, SimulatedBrowser};
use fullshot_capture::*;

fn capture(browser: &SimulatedBrowser) -> CommandResponse {
    take_screenshot(browser, browser, &CaptureOptions::default())
}

fn png_size(response: &CommandResponse) -> (u32, u32) {
    let text = response.value().expect("expected a success response");
    let png = decode_base64(text).expect("value should be base64");
    let image = image::load_from_memory(&png).expect("value should be a PNG");
    (image.width(), image.height())
}

/// 1024x768 frame around a 1000x700 viewport with an 800x600 client area
/// showing an 800x1200 document.
fn tall_document() -> Scenario {
    Scenario {
        window: WindowGeometry::new(1024, 768),
        chrome: WindowGeometry::new(24, 68),
        client_insets: WindowGeometry::new(200, 100),
        content: WindowGeometry::new(800, 1200),
        ..Scenario::default()
    }
}

#[test]
fn test_fitting_content_leaves_window_alone() {
    let browser = SimulatedBrowser::new(Scenario::default());
    let response = capture(&browser);

    assert!(response.is_success());
    assert_eq!(png_size(&response), (1024 - 24 - 17, 768 - 68 - 17));
    assert!(browser.calls().resizes.is_empty());
    assert_eq!(browser.frame_size(), WindowGeometry::new(1024, 768));
}

#[test]
fn test_tall_document_grows_height_and_restores() {
    let browser = SimulatedBrowser::new(tall_document());
    let response = capture(&browser);

    assert!(response.is_success());
    // (1200 + 100 - 2) - 700 = 598 extra pixels of height, width untouched.
    assert_eq!(
        browser.calls().resizes,
        vec![WindowGeometry::new(1024, 768 + 598), WindowGeometry::new(1024, 768)]
    );
    assert_eq!(browser.frame_size(), WindowGeometry::new(1024, 768));
    assert_eq!(png_size(&response), (800, 1298 - 100));
}

#[test]
fn test_wide_document_grows_width_only() {
    let browser = SimulatedBrowser::new(Scenario {
        content: WindowGeometry::new(3000, 300),
        ..Scenario::default()
    });
    let response = capture(&browser);

    assert!(response.is_success());
    let resizes = browser.calls().resizes;
    assert_eq!(resizes[0], WindowGeometry::new(1024 + (3000 + 17 - 1000), 768));
    assert_eq!(resizes.len(), 2);
    assert_eq!(browser.frame_size(), WindowGeometry::new(1024, 768));
}

#[test]
fn test_huge_document_is_clamped() {
    let browser = SimulatedBrowser::new(Scenario {
        content: WindowGeometry::new(200_000, 300),
        // Keep the simulated frame small so the test does not allocate gigabytes.
        max_window: Some(WindowGeometry::new(2000, 768)),
        ..Scenario::default()
    });
    let response = capture(&browser);

    assert!(response.is_success());
    let requested = browser.calls().resizes[0];
    assert_eq!(requested.width, 1024 + (MAX_CAPTURE_DIMENSION - 1000));
    assert_eq!(browser.frame_size(), WindowGeometry::new(1024, 768));
}

#[test]
fn test_repeated_capture_of_fitting_window_is_idempotent() {
    let browser = SimulatedBrowser::new(Scenario::default());
    let first = capture(&browser);
    let second = capture(&browser);

    assert_eq!(png_size(&first), png_size(&second));
    assert!(browser.calls().resizes.is_empty());
    assert_eq!(browser.frame_size(), WindowGeometry::new(1024, 768));
}

#[test]
fn test_nothing_drawn_returns_empty_success() {
    let browser = SimulatedBrowser::new(Scenario {
        paint: vec![PaintOutcome::Fail; 6],
        ..tall_document()
    });
    let response = capture(&browser);

    assert_eq!(response, CommandResponse::success(""));
    assert_eq!(browser.calls().prints, 6);
    assert_eq!(browser.frame_size(), WindowGeometry::new(1024, 768));
    // Grown and restored on both attempts.
    assert_eq!(browser.calls().resizes.len(), 4);
}

#[test]
fn test_second_attempt_recovers() {
    let browser = SimulatedBrowser::new(Scenario {
        paint: vec![PaintOutcome::Fail; 3],
        ..Scenario::default()
    });
    let response = capture(&browser);

    assert!(response.is_success());
    assert!(!response.value().unwrap().is_empty());
    assert_eq!(browser.calls().prints, 4);
}

#[test]
fn test_blank_paints_still_produce_an_image() {
    let browser = SimulatedBrowser::new(Scenario {
        paint: vec![PaintOutcome::Blank; 3],
        ..Scenario::default()
    });
    let response = capture(&browser);

    assert!(!response.value().unwrap().is_empty());
    assert_eq!(browser.calls().prints, 3);
    assert_eq!(browser.calls().redraws, 3);
}

#[test]
fn test_missing_document_is_an_error_without_resizing() {
    let browser = SimulatedBrowser::new(Scenario {
        has_document: false,
        ..tall_document()
    });
    let response = capture(&browser);

    assert!(!response.is_success());
    assert_eq!(response.status(), ErrorCode::UnknownError);
    assert_ne!(response.status().status(), 0);
    assert!(browser.calls().resizes.is_empty());
    assert_eq!(browser.calls().prints, 0);
}

#[test]
fn test_missing_window_is_no_such_window() {
    let browser = SimulatedBrowser::new(Scenario {
        has_window: false,
        ..Scenario::default()
    });
    let response = capture(&browser);

    assert_eq!(response.status(), ErrorCode::NoSuchWindow);
    assert!(browser.calls().resizes.is_empty());
}

#[test]
fn test_missing_canvas_is_an_error() {
    let browser = SimulatedBrowser::new(Scenario {
        has_canvas: false,
        standards_mode: false,
        ..Scenario::default()
    });
    let response = capture(&browser);

    assert_eq!(response.status(), ErrorCode::UnknownError);
    match response {
        CommandResponse::Error { message, .. } => assert!(message.contains("Body")),
        other => panic!("expected an error, got {:?}", other),
    }
}

#[test]
fn test_unreadable_window_metrics_degrade_to_empty() {
    let browser = SimulatedBrowser::new(Scenario {
        window_size_fails: true,
        ..tall_document()
    });
    let response = capture(&browser);

    assert_eq!(response, CommandResponse::success(""));
    assert!(browser.calls().resizes.is_empty());
}

#[test]
fn test_maximized_window_is_remaximized() {
    let browser = SimulatedBrowser::new(Scenario {
        maximized: true,
        restored_window: Some(WindowGeometry::new(1024, 768)),
        window: WindowGeometry::new(1280, 1024),
        ..tall_document()
    });
    let response = capture(&browser);

    assert!(response.is_success());
    let calls = browser.calls();
    assert_eq!(calls.demaximize_calls, 1);
    assert_eq!(calls.maximize_calls, 1);
    assert!(browser.is_window_maximized());
    assert_eq!(browser.frame_size(), WindowGeometry::new(1280, 1024));
}

#[test]
fn test_lagging_layout_is_recalculated() {
    let browser = SimulatedBrowser::new(Scenario {
        layout_lag: 1,
        ..tall_document()
    });
    let response = capture(&browser);

    assert_eq!(browser.calls().recalculations, vec![false]);
    assert_eq!(png_size(&response), (800, 1198));
}

#[test]
fn test_layout_that_never_settles_uses_last_reading() {
    let browser = SimulatedBrowser::new(Scenario {
        layout_lag: 5,
        ..tall_document()
    });
    let response = capture(&browser);

    assert_eq!(browser.calls().recalculations, vec![false, true]);
    assert!(response.is_success());
    assert_eq!(png_size(&response), (800, 600));
}

#[test]
fn test_refused_resize_still_captures() {
    let browser = SimulatedBrowser::new(Scenario {
        max_window: Some(WindowGeometry::new(1024, 1000)),
        ..tall_document()
    });
    let response = capture(&browser);

    assert!(response.is_success());
    assert!(!response.value().unwrap().is_empty());
    assert_eq!(browser.frame_size(), WindowGeometry::new(1024, 768));
}

#[test]
fn test_quirks_mode_document_is_captured() {
    let browser = SimulatedBrowser::new(Scenario {
        standards_mode: false,
        ..tall_document()
    });
    assert!(capture(&browser).is_success());
}

#[test]
fn test_response_wire_form() {
    let browser = SimulatedBrowser::new(Scenario {
        has_document: false,
        ..Scenario::default()
    });
    let json = capture(&browser).to_json();
    assert_eq!(json["status"], 13);
    assert_eq!(json["value"]["error"], "unknown error");
}
