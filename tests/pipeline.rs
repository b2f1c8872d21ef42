use image_enhance::{
    adjust_contrast, bandpass, log_transform, ChannelOrder, Channels, ContrastParameters, Encoding,
    FilterParameters, ImageSession, Layout, PixelBuffer, RawImage, SampleDepth,
};

/// Route engine diagnostics to the test output; filter with RUST_LOG.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// 16-bit BGR image with a bright square on a dark ramp, rows padded to 4 bytes with 0xFF
fn synthetic_bgr16(width: u32, height: u32) -> (Vec<u8>, usize) {
    let row_bytes = width as usize * 3 * 2;
    let stride = row_bytes.div_ceil(4) * 4;
    let mut data = vec![0xFFu8; stride * height as usize];

    for y in 0..height {
        for x in 0..width {
            let inside = (width / 4..3 * width / 4).contains(&x) && (height / 4..3 * height / 4).contains(&y);
            let base = 1000 + (x * 40) as u16;
            let bgr: [u16; 3] = if inside { [4000, 50_000, 60_000] } else { [base, base, base / 2] };
            for (c, v) in bgr.iter().enumerate() {
                let offset = y as usize * stride + (x as usize * 3 + c) * 2;
                data[offset..offset + 2].copy_from_slice(&v.to_le_bytes());
            }
        }
    }

    (data, stride)
}

#[test]
fn viewer_session_load_edit_reset_export() {
    init_tracing();

    let (width, height) = (23u32, 16u32);
    let (data, stride) = synthetic_bgr16(width, height);
    let raw = RawImage {
        stride,
        ..RawImage::packed(width, height, 3, SampleDepth::Sixteen, &data).with_order(ChannelOrder::Bgr)
    };

    let mut session = ImageSession::new();
    session.load(&raw).expect("decode synthetic image");

    let loaded = session.current().cloned().expect("image loaded");
    assert_eq!(loaded.dimensions(), (width, height));
    assert_eq!(loaded.channels(), Channels::Rgb);
    // 60000 is the global maximum: in BGR order it lands in the red channel of the square
    assert_eq!(loaded.pixel(width / 2, height / 2)[0], 255);
    // 500 (red at x = 0) is the global minimum; 0xFFFF padding stays out of the range
    assert_eq!(loaded.pixel(0, 0)[0], 0);

    session.apply_log().unwrap();
    session.apply_contrast(&ContrastParameters::default()).unwrap();
    let params = FilterParameters {
        large_cutoff: 2.0,
        saturate: true,
        ..Default::default()
    };
    assert!(session.apply_bandpass(&params).unwrap().is_none());

    let filtered = session.current().unwrap();
    assert_eq!(filtered.channels(), Channels::Gray);
    assert_eq!(filtered.dimensions(), (width, height));

    // Save path: gray result written as BGR with toolkit row alignment
    let encoding = Encoding::aligned(Layout::Bgr, 4);
    let bytes = session.export(encoding).unwrap();
    assert_eq!(bytes.len(), encoding.stride_for(width) * height as usize);

    let restored = session.reset().unwrap();
    assert_eq!(restored, &loaded);
}

#[test]
fn operations_leave_input_untouched() {
    init_tracing();

    let input = PixelBuffer::from_fn(9, 7, Channels::Rgba, |x, y, c| ((x * 29 + y * 13 + c as u32 * 7) % 256) as u8);
    let snapshot = input.clone();

    let _ = log_transform(&input);
    let _ = adjust_contrast(&input, &ContrastParameters::manual(1.2, 0.8)).unwrap();
    let _ = bandpass(&input, &FilterParameters::default()).unwrap();

    assert_eq!(input, snapshot);
}

#[test]
fn single_pixel_survives_every_operation() {
    let pixel = PixelBuffer::from_samples(1, 1, Channels::Rgba, vec![12, 34, 56, 78]).unwrap();

    let logged = log_transform(&pixel);
    assert_eq!(logged.pixel(0, 0)[3], 78);

    let stretched = adjust_contrast(&pixel, &ContrastParameters::default()).unwrap();
    assert_eq!(stretched, pixel);

    let filtered = bandpass(
        &pixel,
        &FilterParameters {
            large_cutoff: 1.0,
            small_cutoff: 1.0,
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(filtered.dimensions(), (1, 1));
}
