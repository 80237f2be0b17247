use wgblur::host::HostPipeline;
use wgblur::*;

/// Any adapter the machine offers. Tests that need a device return early
/// without one.
fn backend() -> Option<WgBackend> {
    match WgBackend::new(DeviceClass::Any) {
        Ok(backend) => Some(backend),
        Err(err) => {
            eprintln!("skipping: no compute adapter ({err})");
            None
        }
    }
}

fn rgb_fixture(width: u32, height: u32) -> ImageContext {
    let n = (width * height) as usize;
    let r = (0..n).map(|i| (i * 13 % 256) as u8).collect();
    let g = (0..n).map(|i| (i * 7 + 40) as u8).collect();
    let b = (0..n).map(|i| (255 - i * 3 % 256) as u8).collect();
    ImageContext::from_rgb_planes(width, height, Colorspace::None, r, g, b).unwrap()
}

fn gray_fixture(width: u32, height: u32) -> ImageContext {
    let n = (width * height) as usize;
    let pix = (0..n).map(|i| ((i * 37) ^ (i >> 3)) as u8).collect();
    ImageContext::from_gray_plane(width, height, Colorspace::None, pix).unwrap()
}

#[test]
fn zero_length_buffer_is_rejected() {
    let Some(backend) = backend() else { return };
    let err = backend
        .allocate_buffer(AccessMode::ReadWrite, 0, None)
        .err()
        .expect("zero-length allocation must fail");
    assert_eq!(err.code(), Some(status::INVALID_BUFFER_SIZE));
    assert!(err.to_string().contains("invalid buffer size"));
}

#[test]
fn buffers_round_trip_unaligned_lengths() {
    let Some(backend) = backend() else { return };
    let data: Vec<u8> = (0..13).collect();
    let buf = backend
        .allocate_buffer(AccessMode::ReadWrite, data.len(), None)
        .unwrap();
    backend.enqueue_write(&buf, &data).unwrap();
    let mut back = vec![0u8; data.len()];
    backend.enqueue_read_blocking(&buf, &mut back).unwrap();
    assert_eq!(back, data);
    buf.release();

    let init = backend
        .allocate_buffer(AccessMode::ReadWrite, 5, Some(&[9, 8, 7, 6, 5]))
        .unwrap();
    let mut back = vec![0u8; 5];
    backend.enqueue_read_blocking(&init, &mut back).unwrap();
    assert_eq!(back, [9, 8, 7, 6, 5]);
}

#[test]
fn transfers_respect_access_mode() {
    let Some(backend) = backend() else { return };
    let write_only = backend
        .allocate_buffer(AccessMode::WriteOnly, 8, None)
        .unwrap();
    let err = backend.enqueue_write(&write_only, &[0; 8]).unwrap_err();
    assert_eq!(err.code(), Some(status::INVALID_OPERATION));

    let read_only = backend.allocate_buffer(AccessMode::ReadOnly, 8, None).unwrap();
    let err = backend
        .enqueue_read_blocking(&read_only, &mut [0; 8])
        .unwrap_err();
    assert_eq!(err.code(), Some(status::INVALID_OPERATION));
}

#[test]
fn build_failure_carries_compiler_log() {
    let Some(backend) = backend() else { return };
    let err = backend
        .compile_program("fn broken( {", &CompileOptions::default())
        .err()
        .expect("malformed source must not compile");
    assert_eq!(err.code(), Some(status::BUILD_PROGRAM_FAILURE));
    assert!(!err.diagnostics().unwrap_or_default().is_empty());
}

#[test]
fn unknown_entry_point_is_invalid_kernel_name() {
    let Some(backend) = backend() else { return };
    let program = backend
        .compile_program(DEFAULT_KERNEL_SOURCE, &CompileOptions::default())
        .unwrap();
    let err = backend
        .create_kernel(&program, "img_sharpen")
        .err()
        .expect("missing entry point must fail");
    assert_eq!(err.code(), Some(status::INVALID_KERNEL_NAME));
}

#[test]
fn accelerator_matches_host_reference() {
    let Some(backend) = backend() else { return };
    let program = backend
        .compile_program(DEFAULT_KERNEL_SOURCE, &CompileOptions::default())
        .unwrap();
    let config = PipelineConfig::default();
    let accel = AccelPipeline::new(&backend, &program, &config);
    let host = HostPipeline::default();

    // 37 * 29 = 1073 pixels: neither axis a multiple of the group size.
    let rgb = rgb_fixture(37, 29);
    let from_device = run(&accel, &rgb).unwrap();
    let from_host = run(&host, &rgb).unwrap();
    assert_eq!(from_device, from_host);
}

#[test]
fn grayscale_of_white_pixel_is_white() {
    let Some(backend) = backend() else { return };
    let program = backend
        .compile_program(DEFAULT_KERNEL_SOURCE, &CompileOptions::default())
        .unwrap();
    let config = PipelineConfig::default();
    let accel = AccelPipeline::new(&backend, &program, &config);

    let rgb = ImageContext::from_rgb_planes(1, 1, Colorspace::None, vec![255], vec![255], vec![255])
        .unwrap();
    let mut gray = ImageContext::new(1, 1, ImageKind::Grayscale, Colorspace::None).unwrap();
    accel.grayscale(&rgb, &mut gray).unwrap();
    assert_eq!(gray.gray().unwrap(), &[255]);
}

#[test]
fn grayscale_covers_images_past_one_dispatch_row() {
    let Some(backend) = backend() else { return };
    let program = backend
        .compile_program(DEFAULT_KERNEL_SOURCE, &CompileOptions::default())
        .unwrap();
    let config = PipelineConfig::default();
    let accel = AccelPipeline::new(&backend, &program, &config);

    // 6 M pixels need more than 65535 groups of 64.
    let rgb = rgb_fixture(3000, 2000);
    let mut from_device = ImageContext::new(3000, 2000, ImageKind::Grayscale, Colorspace::None).unwrap();
    accel.grayscale(&rgb, &mut from_device).unwrap();

    let mut from_host = from_device.clone();
    HostPipeline::default()
        .grayscale(&rgb, &mut from_host)
        .unwrap();
    assert_eq!(from_device, from_host);
}

#[test]
fn in_place_blur_matches_distinct_output() {
    let Some(backend) = backend() else { return };
    let program = backend
        .compile_program(DEFAULT_KERNEL_SOURCE, &CompileOptions::default())
        .unwrap();
    let config = PipelineConfig::default();
    let accel = AccelPipeline::new(&backend, &program, &config);

    let input = gray_fixture(20, 10);
    let mut distinct = ImageContext::new(20, 10, ImageKind::Grayscale, Colorspace::None).unwrap();
    accel.gaussian_blur(&input, &mut distinct).unwrap();

    let mut in_place = input.clone();
    accel.gaussian_blur_in_place(&mut in_place).unwrap();
    assert_eq!(in_place, distinct);
    assert_ne!(in_place, input);
}

#[test]
fn stages_reject_mismatched_contexts() {
    let Some(backend) = backend() else { return };
    let program = backend
        .compile_program(DEFAULT_KERNEL_SOURCE, &CompileOptions::default())
        .unwrap();
    let config = PipelineConfig::default();
    let accel = AccelPipeline::new(&backend, &program, &config);

    let rgb = rgb_fixture(4, 4);
    let mut small = ImageContext::new(2, 2, ImageKind::Grayscale, Colorspace::None).unwrap();
    assert!(matches!(
        accel.grayscale(&rgb, &mut small),
        Err(WgError::DimensionMismatch { .. })
    ));

    let mut also_rgb = rgb_fixture(4, 4);
    assert!(matches!(
        accel.gaussian_blur_in_place(&mut also_rgb),
        Err(WgError::KindMismatch { .. })
    ));
}
