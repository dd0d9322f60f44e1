//! End-to-end diagnosis scenarios

use diagnosis::{
    AnalyzerToggles, ClassLabels, ClassifierConfig, DecisionFunction, DelimitedSource,
    DiagnosisConfig, DiagnosisError, DiagnosisPipeline, ErrorKind, FaultModel, FeatureSchema,
    ModelClassifier, ModelHandle, Normalizer, ScaleConfig, Signal, Statistic, SyntheticSource,
    Tone, Verdict, WaveformSource,
};
use feature_engine::{AnalysisError, TimeFrequencyAnalyzer, WaveletKernel};
use std::io::Write;
use std::sync::Arc;

fn reference() -> Signal {
    SyntheticSource::pump_reference().generate().unwrap()
}

/// Low-level noise with a sharp spike every 100 samples
fn impulsive() -> Signal {
    let base = SyntheticSource::new(1000.0, 1000)
        .with_noise(0.05, 11)
        .generate()
        .unwrap();
    let samples: Vec<f64> = base
        .samples()
        .iter()
        .enumerate()
        .map(|(i, v)| if i % 100 == 0 { v + 5.0 } else { *v })
        .collect();
    Signal::new(samples, 1000.0).unwrap()
}

/// Fault iff excess kurtosis > 0
fn kurtosis_model() -> FaultModel {
    FaultModel::new(
        Arc::new(FeatureSchema::acoustic()),
        Normalizer::identity(1),
        DecisionFunction::Linear {
            weights: vec![1.0],
            bias: 0.0,
        },
        ClassLabels::default(),
    )
    .unwrap()
}

#[test]
fn reference_spectrum_has_both_tones() {
    let pipeline = DiagnosisPipeline::new(DiagnosisConfig::default()).unwrap();
    let result = pipeline.diagnose(&reference()).unwrap();
    let spectrum = result.spectrum.as_ref().unwrap();

    let mut bins: Vec<(f64, f64)> = spectrum.iter().collect();
    bins.sort_by(|a, b| b.1.total_cmp(&a.1));

    assert!((bins[0].0 - 50.0).abs() < 1e-9, "largest peak at {} Hz", bins[0].0);
    assert!((bins[1].0 - 120.0).abs() < 1e-9, "second peak at {} Hz", bins[1].0);
    assert!(bins[0].1 > bins[1].1);
}

#[test]
fn silent_signal_is_no_fault() {
    let pipeline = DiagnosisPipeline::new(DiagnosisConfig::default()).unwrap();
    let silent = SyntheticSource::new(1000.0, 1000).generate().unwrap();

    let result = pipeline.diagnose(&silent).unwrap();
    assert_eq!(result.verdict, Verdict::NoFault);
    assert_eq!(result.score, Some(0.0));
    assert_eq!(result.summary.std_dev, 0.0);
}

#[test]
fn offset_signal_is_fault() {
    let pipeline = DiagnosisPipeline::new(DiagnosisConfig::default()).unwrap();
    let offset = SyntheticSource::new(1000.0, 1000)
        .with_tone(Tone::new(50.0, 0.2))
        .with_offset(0.5)
        .generate()
        .unwrap();

    let result = pipeline.diagnose(&offset).unwrap();
    assert_eq!(result.verdict, Verdict::Fault);
    assert!(result.score.unwrap() > 0.3);
}

#[test]
fn threshold_on_other_statistic() {
    let config = DiagnosisConfig {
        classifier: ClassifierConfig::Threshold {
            statistic: Statistic::Rms,
            threshold: 0.5,
        },
        ..Default::default()
    };
    let pipeline = DiagnosisPipeline::new(config).unwrap();
    // RMS of the reference mix is sqrt(0.5 + 0.125) ~ 0.79
    assert_eq!(pipeline.diagnose(&reference()).unwrap().verdict, Verdict::Fault);
}

#[test]
fn model_classifier_from_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kurtosis.json");
    kurtosis_model().save(&path).unwrap();

    let config = DiagnosisConfig {
        classifier: ClassifierConfig::Model { path },
        ..Default::default()
    };
    let pipeline = DiagnosisPipeline::new(config).unwrap();

    let healthy = pipeline.diagnose(&reference()).unwrap();
    assert_eq!(healthy.verdict, Verdict::NoFault);
    assert_eq!(healthy.classifier, "model");
    let features = healthy.features.as_ref().unwrap();
    assert_eq!(features.schema().name(), "acoustic");
    assert!(healthy.probability.unwrap() < 0.5);

    let faulty = pipeline.diagnose(&impulsive()).unwrap();
    assert_eq!(faulty.verdict, Verdict::Fault);
    assert!(faulty.probability.unwrap() > 0.5);
}

#[test]
fn model_hot_reload_through_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kurtosis.bin");
    kurtosis_model().save(&path).unwrap();

    let pipeline = DiagnosisPipeline::new(DiagnosisConfig {
        classifier: ClassifierConfig::Model { path },
        ..Default::default()
    })
    .unwrap();
    assert_eq!(pipeline.diagnose(&reference()).unwrap().verdict, Verdict::NoFault);

    // Same schema, but everything above excess kurtosis -10 is a fault
    let lenient = FaultModel::new(
        Arc::new(FeatureSchema::acoustic()),
        Normalizer::identity(1),
        DecisionFunction::Linear {
            weights: vec![1.0],
            bias: 10.0,
        },
        ClassLabels::default(),
    )
    .unwrap();
    pipeline.model_handle().unwrap().publish(lenient);
    assert_eq!(pipeline.diagnose(&reference()).unwrap().verdict, Verdict::Fault);
}

#[test]
fn schema_mismatch_is_reported() {
    // Model trained with different bands and scales than the pipeline's vibration schema
    let foreign = Arc::new(FeatureSchema::vibration(&[0.0, 25.0, 75.0], &[1, 2, 3]).unwrap());
    let classifier = ModelClassifier::new(model_handle(&foreign));

    let pipeline = DiagnosisPipeline::new(DiagnosisConfig::default()).unwrap();
    let vector = pipeline.extract_features(&reference()).unwrap();
    assert_ne!(vector.schema(), &foreign);

    let error = DiagnosisError::from(classifier.classify_vector(&vector).unwrap_err());
    assert_eq!(error.kind(), ErrorKind::SchemaMismatch);
}

#[test]
fn pipeline_extracts_under_model_schema() {
    let foreign = Arc::new(FeatureSchema::vibration(&[0.0, 25.0, 75.0], &[1, 2, 3]).unwrap());
    let pipeline = DiagnosisPipeline::with_classifier(
        DiagnosisConfig::default(),
        Arc::new(ModelClassifier::new(model_handle(&foreign))),
    )
    .unwrap();

    let result = pipeline.diagnose(&reference()).unwrap();
    assert_eq!(result.features.unwrap().schema(), &foreign);
}

/// Zero-weight linear model over `schema`
fn model_handle(schema: &Arc<FeatureSchema>) -> ModelHandle {
    ModelHandle::with_model(
        FaultModel::new(
            Arc::clone(schema),
            Normalizer::identity(schema.len()),
            DecisionFunction::Linear {
                weights: vec![0.0; schema.len()],
                bias: 0.0,
            },
            ClassLabels::default(),
        )
        .unwrap(),
    )
}

#[test]
fn model_unavailable_is_reported() {
    let pipeline = DiagnosisPipeline::with_classifier(
        DiagnosisConfig::default(),
        Arc::new(ModelClassifier::default()),
    )
    .unwrap();

    let error = pipeline.diagnose(&reference()).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::ModelUnavailable);
}

#[test]
fn incomplete_feature_set_when_analyzer_disabled() {
    let schema = Arc::new(FeatureSchema::vibration(&[0.0, 50.0, 100.0], &[1, 2]).unwrap());
    let config = DiagnosisConfig {
        analyzers: AnalyzerToggles {
            spectrum: false,
            time_frequency: true,
        },
        ..Default::default()
    };
    let pipeline = DiagnosisPipeline::with_classifier(
        config,
        Arc::new(ModelClassifier::new(model_handle(&schema))),
    )
    .unwrap();

    let error = pipeline.diagnose(&reference()).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::IncompleteFeatureSet);
}

#[test]
fn incomplete_feature_set_when_scale_not_computed() {
    let schema = Arc::new(FeatureSchema::vibration(&[], &[1, 200]).unwrap());
    let pipeline = DiagnosisPipeline::with_classifier(
        DiagnosisConfig::default(),
        Arc::new(ModelClassifier::new(model_handle(&schema))),
    )
    .unwrap();

    let error = pipeline.diagnose(&reference()).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::IncompleteFeatureSet);
}

#[test]
fn invalid_scales_are_rejected() {
    let direct = TimeFrequencyAnalyzer::default().decompose(&reference(), &[], &WaveletKernel::default());
    assert!(matches!(direct, Err(AnalysisError::InvalidScales(_))));

    let config = DiagnosisConfig {
        scales: ScaleConfig::List {
            values: vec![1, 5, 5, 9],
        },
        ..Default::default()
    };
    let error = DiagnosisPipeline::new(config).err().unwrap();
    assert_eq!(error.kind(), ErrorKind::InvalidScales);
}

#[test]
fn invalid_signal_is_rejected_at_ingestion() {
    let error = DiagnosisError::from(Signal::new(vec![1.0, f64::NAN, 2.0], 100.0).unwrap_err());
    assert_eq!(error.kind(), ErrorKind::InvalidSignal);

    let error = DiagnosisError::from(Signal::new(vec![1.0], 100.0).unwrap_err());
    assert_eq!(error.kind(), ErrorKind::InvalidSignal);
}

#[test]
fn delimited_file_diagnosis() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for v in reference().samples() {
        writeln!(file, "{v}\t0").unwrap();
    }

    let signal = DelimitedSource::new(file.path(), 1000.0).load().unwrap();
    assert_eq!(signal.len(), 1000);

    let config = DiagnosisConfig {
        sampling_rate: Some(1000.0),
        ..Default::default()
    };
    let result = DiagnosisPipeline::new(config).unwrap().diagnose(&signal).unwrap();
    assert_eq!(result.verdict, Verdict::NoFault);
    assert_eq!(result.report().dominant_frequency_hz, Some(50.0));
}

#[test]
fn config_file_drives_pipeline() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
[analyzers]
time_frequency = false

[classifier]
variant = "threshold"
statistic = "peak_to_peak"
threshold = 3.0
"#
    )
    .unwrap();

    let config = DiagnosisConfig::load(Some(file.path())).unwrap();
    let pipeline = DiagnosisPipeline::new(config).unwrap();
    let result = pipeline.diagnose(&reference()).unwrap();

    assert!(result.time_frequency.is_none());
    // Peak-to-peak of 50 Hz + 0.5 x 120 Hz stays below 3
    assert_eq!(result.verdict, Verdict::NoFault);
}

#[test]
fn concurrent_diagnoses_agree() {
    let pipeline = Arc::new(DiagnosisPipeline::new(DiagnosisConfig::default()).unwrap());
    let signal = reference();
    let expected = pipeline.diagnose(&signal).unwrap().summary.kurtosis;

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let pipeline = Arc::clone(&pipeline);
                let signal = signal.clone();
                scope.spawn(move || pipeline.diagnose(&signal).unwrap())
            })
            .collect();
        for handle in handles {
            let result = handle.join().unwrap();
            assert_eq!(result.summary.kurtosis.to_bits(), expected.to_bits());
            assert_eq!(result.verdict, Verdict::NoFault);
        }
    });
}

#[test]
fn result_serializes_to_json() {
    let pipeline = DiagnosisPipeline::new(DiagnosisConfig::default()).unwrap();
    let result = pipeline.diagnose(&reference()).unwrap();

    let report = serde_json::to_value(result.report()).unwrap();
    assert_eq!(report["verdict"], "NO_FAULT");
    assert_eq!(report["classifier"], "threshold");
    assert_eq!(report["num_samples"], 1000);

    let full = serde_json::to_value(&result).unwrap();
    assert!(full["spectrum"]["magnitudes"].is_array());
    assert_eq!(full["summary"]["signal"]["samples"].as_array().unwrap().len(), 1000);
}
