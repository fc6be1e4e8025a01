// tests/engine_tests.rs
use std::path::Path;

use gdal::raster::{Buffer, GdalDataType};
use gdal::{Dataset, DriverManager};
use tempfile::TempDir;

use gipe::config::EngineOptions;
use gipe::dialog::{Dialog, DialogState, LogNotifier};
use gipe::error::EngineError;
use gipe::indices::{build, IndexKind};
use gipe::processing::{CalcParams, OutputType, ParallelProcessor, RasterEngine, Slot};
use gipe::workspace::{GdalWorkspace, Workspace};

const WIDTH: usize = 3;
const HEIGHT: usize = 2;

/// Helper function to write a float32 GeoTIFF with one entry per band
fn write_bands(path: &Path, width: usize, height: usize, bands: &[Vec<f32>], nodata: Option<f64>) {
    let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
    let mut dataset = driver
        .create_with_band_type::<f32, _>(path, width, height, bands.len())
        .unwrap();
    for (i, data) in bands.iter().enumerate() {
        let mut band = dataset.rasterband(i + 1).unwrap();
        if nodata.is_some() {
            band.set_no_data_value(nodata).unwrap();
        }
        let mut buffer = Buffer::new((width, height), data.clone());
        band.write((0, 0), (width, height), &mut buffer).unwrap();
    }
}

/// Helper function to read band 1 of a raster
fn read_output(path: &Path) -> (Vec<f32>, Option<f64>) {
    let dataset = Dataset::open(path).unwrap();
    let band = dataset.rasterband(1).unwrap();
    let (width, height) = dataset.raster_size();
    let buffer = band
        .read_as::<f32>((0, 0), (width, height), (width, height), None)
        .unwrap();
    (buffer.data().to_vec(), band.no_data_value())
}

fn options() -> EngineOptions {
    EngineOptions {
        threads: 2,
        strip_rows: 1,
        ..Default::default()
    }
}

/// Scene with NIR in band 4, Red in band 3 and Blue in band 1
fn scene(dir: &TempDir) -> String {
    let path = dir.path().join("scene.tif");
    let blue = vec![0.05, 2.0, 0.0, 0.0, 0.0, 0.0];
    let green = vec![0.0; WIDTH * HEIGHT];
    let red = vec![1000.0, 0.0, 4000.0, 5000.0, 300.0, 100.0];
    let nir = vec![4000.0, 0.0, 6000.0, 5000.0, 100.0, 300.0];
    write_bands(&path, WIDTH, HEIGHT, &[blue, green, red, nir], None);
    path.to_string_lossy().into_owned()
}

fn params(source: &str, formula: &str, output: &Path, options: &str) -> CalcParams {
    CalcParams::new(
        vec![Slot::bound(source, 4), Slot::bound(source, 3)],
        formula,
        0.0,
        OutputType::Float32,
        "",
        options,
        output,
    )
}

#[test]
fn test_ndvi_raster() {
    let dir = TempDir::new().unwrap();
    let source = scene(&dir);
    let output = dir.path().join("ndvi.tif");

    let request = build(Some(source.as_str()), 4, 3, -1, &[IndexKind::Ndvi], Some(output.as_path())).unwrap();
    let processor = ParallelProcessor::new(&options()).unwrap();
    processor.run(&request.to_params(&options())).unwrap();

    let (values, nodata) = read_output(&output);
    assert_eq!(nodata, Some(0.0));

    // NIR, RED -> expected
    let expected = [
        0.6,     // (4000, 1000)
        -9999.0, // (0, 0) zero sum
        0.0,     // (6000, 4000) sum reaches 10000
        0.0,     // (5000, 5000)
        -0.5,    // (100, 300)
        0.5,     // (300, 100)
    ];
    for (i, expected) in expected.iter().enumerate() {
        assert!(
            (values[i] - expected).abs() < 1e-6,
            "Expected {}, got {} at index {}",
            expected,
            values[i],
            i
        );
    }
}

#[test]
fn test_input_nodata_is_propagated() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("masked.tif");
    write_bands(
        &path,
        2,
        1,
        &[vec![-1.0, 300.0], vec![100.0, 100.0]],
        Some(-1.0),
    );
    let source = path.to_string_lossy().into_owned();
    let output = dir.path().join("out.tif");

    let params = CalcParams::new(
        vec![Slot::bound(&source, 1), Slot::bound(&source, 2)],
        "(A-B)/(A+B)",
        0.0,
        OutputType::Float32,
        "",
        "",
        &output,
    );
    ParallelProcessor::new(&options()).unwrap().run(&params).unwrap();

    let (values, _) = read_output(&output);
    assert_eq!(values[0], 0.0);
    assert!((values[1] - 0.5).abs() < 1e-6);
}

/// Two-slot calculation over bands 1 and 2 of `source`
fn two_band_params(source: &Path, formula: &str, rtype: OutputType, output: &Path) -> CalcParams {
    let source = source.to_string_lossy();
    CalcParams::new(
        vec![Slot::bound(&source, 1), Slot::bound(&source, 2)],
        formula,
        0.0,
        rtype,
        "",
        "",
        output,
    )
}

#[test]
fn test_non_finite_results_become_nodata() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("zeros.tif");
    write_bands(&path, 3, 1, &[vec![5.0, 4.0, -9.0], vec![0.0, 2.0, 0.0]], None);
    let processor = ParallelProcessor::new(&options()).unwrap();

    // Unguarded division: 5/0 is infinite, 4/2 is finite, -9/0 is infinite
    let output = dir.path().join("ratio.tif");
    processor
        .run(&two_band_params(&path, "A/B", OutputType::Float32, &output))
        .unwrap();
    let (values, _) = read_output(&output);
    assert_eq!(values, vec![0.0, 2.0, 0.0]);

    // Square root of a negative number is NaN
    let output = dir.path().join("sqrt.tif");
    processor
        .run(&two_band_params(&path, "sqrt(-A)", OutputType::Float32, &output))
        .unwrap();
    let (values, _) = read_output(&output);
    assert_eq!(values, vec![0.0, 0.0, 3.0]);
}

#[test]
fn test_integer_outputs_saturate() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("wide.tif");
    write_bands(
        &path,
        4,
        1,
        &[vec![40000.0, -40000.0, 12.7, 300.0], vec![0.0; 4]],
        None,
    );
    let processor = ParallelProcessor::new(&options()).unwrap();

    let output = dir.path().join("int16.tif");
    processor
        .run(&two_band_params(&path, "A+B", OutputType::Int16, &output))
        .unwrap();
    let dataset = Dataset::open(&output).unwrap();
    assert_eq!(dataset.rasterband(1).unwrap().band_type(), GdalDataType::Int16);
    let (values, nodata) = read_output(&output);
    assert_eq!(values, vec![32767.0, -32768.0, 12.0, 300.0]);
    assert_eq!(nodata, Some(0.0));

    let output = dir.path().join("byte.tif");
    processor
        .run(&two_band_params(&path, "A+B", OutputType::Byte, &output))
        .unwrap();
    let dataset = Dataset::open(&output).unwrap();
    assert_eq!(dataset.rasterband(1).unwrap().band_type(), GdalDataType::UInt8);
    let (values, _) = read_output(&output);
    assert_eq!(values, vec![255.0, 0.0, 12.0, 255.0]);
}

#[test]
fn test_every_output_type_is_written() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("small.tif");
    write_bands(&path, 2, 1, &[vec![7.0, 100.0], vec![2.0, 50.0]], None);
    let processor = ParallelProcessor::new(&options()).unwrap();

    let types = [
        (OutputType::Byte, GdalDataType::UInt8),
        (OutputType::Int16, GdalDataType::Int16),
        (OutputType::UInt16, GdalDataType::UInt16),
        (OutputType::UInt32, GdalDataType::UInt32),
        (OutputType::Int32, GdalDataType::Int32),
        (OutputType::Float32, GdalDataType::Float32),
        (OutputType::Float64, GdalDataType::Float64),
    ];
    for (rtype, expected) in types {
        let output = dir.path().join(format!("out_{}.tif", rtype.code()));
        processor
            .run(&two_band_params(&path, "A-B", rtype, &output))
            .unwrap();
        let dataset = Dataset::open(&output).unwrap();
        assert_eq!(dataset.rasterband(1).unwrap().band_type(), expected, "{rtype:?}");
        let (values, _) = read_output(&output);
        assert_eq!(values, vec![5.0, 50.0], "{rtype:?}");
    }
}

#[test]
fn test_multi_row_strips_with_short_last_strip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tall.tif");
    let (width, height) = (2, 5);
    let a: Vec<f32> = (0..width * height).map(|i| i as f32).collect();
    let b: Vec<f32> = (0..width * height).map(|i| (i * 100) as f32).collect();
    write_bands(&path, width, height, &[a, b], None);
    let output = dir.path().join("strips.tif");

    // Strips of 2, 2 and 1 rows
    let options = EngineOptions {
        threads: 2,
        strip_rows: 2,
        ..Default::default()
    };
    ParallelProcessor::new(&options)
        .unwrap()
        .run(&two_band_params(&path, "A+B+1", OutputType::Float32, &output))
        .unwrap();

    let (values, _) = read_output(&output);
    let expected: Vec<f32> = (0..width * height).map(|i| (i * 101 + 1) as f32).collect();
    assert_eq!(values, expected);
}

#[test]
fn test_creation_options_are_applied() {
    let dir = TempDir::new().unwrap();
    let source = scene(&dir);
    let output = dir.path().join("compressed.tif");

    let params = params(&source, "A-B", &output, "COMPRESS=DEFLATE|TILED=YES");
    ParallelProcessor::new(&options()).unwrap().run(&params).unwrap();

    let (values, _) = read_output(&output);
    assert_eq!(values.len(), WIDTH * HEIGHT);
    assert_eq!(values[0], 3000.0);
}

#[test]
fn test_malformed_creation_option() {
    let dir = TempDir::new().unwrap();
    let source = scene(&dir);
    let output = dir.path().join("bad.tif");

    let result = ParallelProcessor::new(&options())
        .unwrap()
        .run(&params(&source, "A-B", &output, "COMPRESS"));
    assert!(matches!(result, Err(EngineError::InvalidOption(o)) if o == "COMPRESS"));
}

#[test]
fn test_formula_slot_without_input() {
    let dir = TempDir::new().unwrap();
    let source = scene(&dir);
    let output = dir.path().join("missing.tif");

    let result = ParallelProcessor::new(&options())
        .unwrap()
        .run(&params(&source, "A+D", &output, ""));
    assert!(matches!(result, Err(EngineError::MissingInput('D'))));
    assert!(!output.exists());
}

#[test]
fn test_band_out_of_range() {
    let dir = TempDir::new().unwrap();
    let source = scene(&dir);
    let output = dir.path().join("range.tif");

    let params = CalcParams::new(
        vec![Slot::bound(&source, 5)],
        "A",
        0.0,
        OutputType::Float32,
        "",
        "",
        &output,
    );
    let result = ParallelProcessor::new(&options()).unwrap().run(&params);
    assert!(matches!(
        result,
        Err(EngineError::BandOutOfRange { band: 5, count: 4, .. })
    ));
}

#[test]
fn test_size_mismatch() {
    let dir = TempDir::new().unwrap();
    let source = scene(&dir);
    let small = dir.path().join("small.tif");
    write_bands(&small, 1, 1, &[vec![1.0]], None);
    let output = dir.path().join("mismatch.tif");

    let params = CalcParams::new(
        vec![Slot::bound(&source, 1), Slot::bound(&small.to_string_lossy(), 1)],
        "A+B",
        0.0,
        OutputType::Float32,
        "",
        "",
        &output,
    );
    let result = ParallelProcessor::new(&options()).unwrap().run(&params);
    assert!(matches!(result, Err(EngineError::SizeMismatch { slot: 'B', .. })));
}

#[test]
fn test_dialog_end_to_end() {
    let dir = TempDir::new().unwrap();
    let source = scene(&dir);
    let output = dir.path().join("evi.tif");

    let workspace = GdalWorkspace::new();
    let layer = workspace.load_raster(Path::new(&source), "scene").unwrap();
    assert_eq!(layer.band_count, 4);
    assert_eq!((layer.width, layer.height), (WIDTH, HEIGHT));

    let processor = ParallelProcessor::new(&options()).unwrap();
    let mut dialog = Dialog::new(processor, workspace, LogNotifier, options());
    dialog.set_layer(Some(layer));
    dialog.nir.select(4);
    dialog.red.select(3);
    dialog.blue.select(1);
    dialog.set_index_checked(IndexKind::Evi, true);
    dialog.set_output_path(&output);

    dialog.calculate().unwrap();
    assert_eq!(dialog.state(), DialogState::Closed);

    let layers = dialog.workspace().layers();
    assert_eq!(layers.len(), 1);
    assert_eq!(layers[0].name, "evi");

    let style = std::fs::read_to_string(GdalWorkspace::style_path(&output)).unwrap();
    assert!(style.contains("classificationMin=\"-1\""));
    assert!(style.contains("classificationMax=\"1\""));

    let (values, _) = read_output(&output);
    // (4000, 1000, 0.05): 2.5 * 3000 / (4000 + 6000 - 0.375 + 1)
    assert!((values[0] - 7500.0 / 10000.625).abs() < 1e-4);
    // (0, 0, 2): zero numerator, written as the no-data value
    assert_eq!(values[1], 0.0);
}

#[test]
fn test_missing_output_raster_fails_to_load() {
    let dir = TempDir::new().unwrap();
    let workspace = GdalWorkspace::new();
    assert!(workspace
        .load_raster(&dir.path().join("absent.tif"), "absent")
        .is_err());
}
