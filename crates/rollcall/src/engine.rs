use crate::config::Config;
use anyhow::{Context, Result};
use rollcall_core::{
    AttendanceLog, Compositor, Devices, IdentityTable, LoopingClip, RecognitionPolicy, Session,
    SessionSettings,
};
use rollcall_hw::camera::device_path_for_index;
use rollcall_hw::{
    primary_display_size, Camera, CascadeDetector, CascadeParams, LbphResolver, TextOverlay,
    VideoFile, Window,
};

/// Open every device and model the loop needs, failing fast on the first error.
///
/// The returned session owns all handles, so they are released when it finishes.
pub fn open_session(config: &Config) -> Result<Session> {
    let attendance = AttendanceLog::new(&config.attendance_dir);
    attendance
        .ensure_dir()
        .context("failed to prepare attendance directory")?;

    let video = VideoFile::open(&config.background_path).context("failed to open background video")?;
    let background = LoopingClip::new(video);

    let device = device_path_for_index(config.camera_index);
    let camera = Camera::open(&device).with_context(|| format!("failed to open camera {device}"))?;
    tracing::info!(
        device = %device,
        width = camera.width,
        height = camera.height,
        fourcc = ?camera.fourcc,
        "camera opened"
    );

    let detector = CascadeDetector::load(
        &config.cascade_path,
        CascadeParams {
            scale_factor: config.scale_factor,
            min_neighbors: config.min_neighbors,
        },
    )
    .context("failed to load face cascade")?;

    let resolver = LbphResolver::load(&config.model_path).context("failed to load LBPH model")?;

    let identities = IdentityTable::load(&config.roster_path).context("failed to load roster")?;

    let overlay = TextOverlay::load(&config.font_path).context("failed to load label font")?;
    let screen = Window::open(&config.window_title).context("failed to open display window")?;

    let display_size = config.display_size(primary_display_size);
    tracing::info!(width = display_size.0, height = display_size.1, "canvas size");

    let devices = Devices {
        live: Box::new(camera),
        background: Box::new(background),
        detector: Box::new(detector),
        resolver: Box::new(resolver),
        overlay: Box::new(overlay),
        screen: Box::new(screen),
    };
    let settings = SessionSettings {
        policy: RecognitionPolicy::new(config.confidence_threshold),
        compositor: Compositor::with_display_size(display_size),
        attendance,
        poll_interval: config.poll_interval,
    };

    tracing::info!(
        threshold = config.confidence_threshold,
        poll_ms = config.poll_interval.as_millis() as u64,
        enrolled = identities.len() - 1,
        "session ready"
    );
    Ok(Session::new(devices, identities, settings))
}
