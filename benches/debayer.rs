use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use skycam_rs::image_pipeline::{
    CfaPattern, ConversionConfig, DebayerStrategy, Debayerer, OutputFormat, RawFrame,
    RawToRgbPipeline, TiffCompression, encode_fits,
};
use std::io::Cursor;

fn generate_mock_frame(width: usize, height: usize) -> RawFrame {
    let data = (0..height)
        .flat_map(|y| (0..width).map(move |x| ((x * 37 + y * 11) % 4096) as u32))
        .collect();
    RawFrame::new(width, height, data, 12).with_cfa(CfaPattern::Rggb)
}

fn benchmark_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("debayer_by_size");

    for size in [256usize, 1024, 2180] {
        let frame = generate_mock_frame(size, size);

        for strategy in [DebayerStrategy::Decimate, DebayerStrategy::Interpolate] {
            let debayerer = Debayerer::new(strategy);
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", strategy).to_lowercase(), size),
                &frame,
                |b, frame| b.iter(|| debayerer.process(black_box(frame))),
            );
        }
    }

    group.finish();
}

fn benchmark_output_formats(c: &mut Criterion) {
    let mut group = c.benchmark_group("fits_to_rgb");
    let fits = match encode_fits(&generate_mock_frame(1024, 1024)) {
        Ok(bytes) => bytes,
        Err(e) => panic!("mock frame encoding failed: {e}"),
    };

    let configs = [
        ("png", ConversionConfig::builder().output_format(OutputFormat::Png).build()),
        ("tiff", ConversionConfig::builder().output_format(OutputFormat::Tiff).build()),
        (
            "tiff_lzw",
            ConversionConfig::builder()
                .output_format(OutputFormat::Tiff)
                .compression(TiffCompression::Lzw)
                .predictor(Some(2))
                .build(),
        ),
    ];

    for (label, config) in configs {
        let pipeline = RawToRgbPipeline::new(config);
        group.bench_with_input(BenchmarkId::from_parameter(label), &fits, |b, data| {
            b.iter(|| {
                let mut output = Cursor::new(Vec::new());
                let _ = pipeline.convert(black_box(data), &mut output);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_strategies, benchmark_output_formats);
criterion_main!(benches);
