use crate::core::instances::DenseInstance;
use crate::core::row_schema::{RowSchema, RowValue};
use crate::models::{ModelSlot, ModelSource, ScoringModel};
use crate::scoring::batch::{resolve_batch_size, BatchAccumulator};
use crate::scoring::{
    output, IncrementalUpdater, InstanceBuilder, PredictionDispatcher, SchemaMapping,
    ScoringConfig, ScoringError,
};
use crate::streams::{RowSink, RowStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

const FEEDBACK_EVERY: u64 = 50_000;

struct StreamState {
    builder: InstanceBuilder,
    dispatcher: PredictionDispatcher,
    accumulator: BatchAccumulator,
    updater: IncrementalUpdater,
    output_schema: RowSchema,
}

/// Scores one row stream against a pre-trained model and emits each input
/// row with the prediction columns appended.
///
/// All per-stream state (mapping, scratch instance, batch buffer, update
/// eligibility) is built lazily when the first row arrives and owned
/// exclusively by this instance; the host may run several scorers in
/// parallel as long as each gets its own.
pub struct StreamScorer {
    stream: Box<dyn RowStream>,
    models: ModelSlot,
    config: ScoringConfig,
    stop: Arc<AtomicBool>,
    state: Option<StreamState>,
    rows_read: u64,
}

impl StreamScorer {
    pub fn new(
        stream: Box<dyn RowStream>,
        source: ModelSource,
        config: ScoringConfig,
    ) -> StreamScorer {
        StreamScorer {
            stream,
            models: ModelSlot::new(source),
            config,
            stop: Arc::new(AtomicBool::new(false)),
            state: None,
            rows_read: 0,
        }
    }

    /// Shares a flag the host can raise to stop the run between rows. An
    /// in-flight batch flush always completes.
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> StreamScorer {
        self.stop = stop;
        self
    }

    /// The output row structure, known once the first row has arrived.
    pub fn output_schema(&self) -> Option<&RowSchema> {
        self.state.as_ref().map(|s| &s.output_schema)
    }

    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    /// Pulls rows until the stream ends or the stop flag is raised,
    /// pushing scored rows into the sink. A final partial batch is always
    /// flushed.
    pub fn run(&mut self, sink: &mut dyn RowSink) -> Result<(), ScoringError> {
        while self.stream.has_more_rows() {
            if self.stop.load(Ordering::Relaxed) {
                debug!(rows = self.rows_read, "stop requested, halting between rows");
                break;
            }
            let Some(row) = self.stream.next_row() else {
                break;
            };
            self.rows_read += 1;
            self.process_row(row, sink)?;

            if self.rows_read % FEEDBACK_EVERY == 0 {
                debug!(rows = self.rows_read, "rows scored");
            }
        }
        self.finish(sink)
    }

    fn process_row(
        &mut self,
        row: Vec<RowValue>,
        sink: &mut dyn RowSink,
    ) -> Result<(), ScoringError> {
        if self.state.is_none() {
            self.init_state(&row)?;
        } else if self.models.is_field_sourced() {
            self.models.select_for_row(&row)?;
        }
        let Some(state) = self.state.as_mut() else {
            return Err(ScoringError::NoModel);
        };

        if state.accumulator.is_accumulating() {
            if let Some(batch) = state.accumulator.push(row) {
                let model = self.models.current()?;
                Self::score_batch_rows(state, model, batch, self.rows_read, sink)?;
            }
            return Ok(());
        }

        let model = self.models.current()?;
        let instance = state.builder.build(&row);
        let predictions = state.dispatcher.score(model, &instance).map_err(|e| {
            ScoringError::RowPrediction {
                row: self.rows_read,
                source: e,
            }
        })?;

        if state.updater.is_enabled() {
            if let Some(model) = self.models.current_mut() {
                state.updater.after_score(model, &instance)?;
            }
        }

        sink.emit(output::append_predictions(row, &predictions))?;
        state.builder.recycle(instance);
        Ok(())
    }

    /// First-row setup: resolve the model, compute the once-per-stream
    /// mapping, decide update eligibility, fix the output structure and
    /// arm the batch accumulator.
    fn init_state(&mut self, first_row: &[RowValue]) -> Result<(), ScoringError> {
        let input = self.stream.schema().clone();
        self.models.init(&input)?;
        self.models.select_for_row(first_row)?;

        let field_sourced = self.models.is_field_sourced();
        let model = self.models.current()?;
        let schema = Arc::clone(model.schema());

        let mapping = SchemaMapping::map(&schema, &input);

        // buffered rows could otherwise be scored against the wrong model
        let batch_mode = model.is_batch_capable() && !field_sourced;

        let updater = IncrementalUpdater::decide(
            model,
            &mapping,
            self.config.update_incremental_model,
            batch_mode,
            field_sourced,
        );

        let output_schema = output::output_schema(&input, model, self.config.output_probabilities);

        let accumulator = if batch_mode {
            let size = resolve_batch_size(
                self.config.batch_size.as_deref(),
                model.preferred_batch_size(),
            );
            debug!(size, "batch scoring enabled");
            BatchAccumulator::accumulating(size)
        } else {
            BatchAccumulator::idle()
        };

        self.state = Some(StreamState {
            builder: InstanceBuilder::new(schema, mapping),
            dispatcher: PredictionDispatcher::new(self.config.output_probabilities),
            accumulator,
            updater,
            output_schema,
        });
        Ok(())
    }

    fn finish(&mut self, sink: &mut dyn RowSink) -> Result<(), ScoringError> {
        let Some(state) = self.state.as_mut() else {
            return Ok(());
        };
        let rows = state.accumulator.drain();
        if rows.is_empty() {
            return Ok(());
        }
        let model = self.models.current()?;
        Self::score_batch_rows(state, model, rows, self.rows_read, sink)
    }

    fn score_batch_rows(
        state: &mut StreamState,
        model: &dyn ScoringModel,
        rows: Vec<Vec<RowValue>>,
        rows_read: u64,
        sink: &mut dyn RowSink,
    ) -> Result<(), ScoringError> {
        if rows.is_empty() {
            return Ok(());
        }
        let first_row = rows_read - rows.len() as u64 + 1;

        // batch members must all be live at once, so no scratch reuse here
        let instances: Vec<DenseInstance> =
            rows.iter().map(|r| state.builder.build_fresh(r)).collect();

        let predictions = state
            .dispatcher
            .score_batch(model, &instances)
            .map_err(|e| ScoringError::BatchPrediction {
                first_row,
                last_row: rows_read,
                source: e,
            })?;

        debug!(rows = rows.len(), "scored batch");
        for (row, preds) in rows.into_iter().zip(predictions.iter()) {
            sink.emit(output::append_predictions(row, preds))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::instances::MISSING_VALUE;
    use crate::core::row_schema::{Field, FieldKind};
    use crate::models::{ModelError, ModelProvider};
    use crate::testing::{
        iris_row_schema, iris_schema, FailingModel, FixedDistributionClassifier,
        SlotVoteClassifier, UpdateSpyClassifier, VecRowSink, VecRowStream,
    };

    fn iris_row(values: [f64; 4], label: &str) -> Vec<RowValue> {
        vec![
            RowValue::Numeric(values[0]),
            RowValue::Numeric(values[1]),
            RowValue::Numeric(values[2]),
            RowValue::Numeric(values[3]),
            if label.is_empty() {
                RowValue::Null
            } else {
                RowValue::Text(label.into())
            },
        ]
    }

    fn scorer_with(
        model: Box<dyn ScoringModel>,
        rows: Vec<Vec<RowValue>>,
        config: ScoringConfig,
    ) -> StreamScorer {
        let stream = VecRowStream::new(iris_row_schema(), rows);
        StreamScorer::new(Box::new(stream), ModelSource::Fixed(model), config)
    }

    #[test]
    fn single_label_column_for_iris() {
        let model = FixedDistributionClassifier::new(iris_schema(), vec![0.9, 0.05, 0.05]);
        let mut scorer = scorer_with(
            Box::new(model),
            vec![iris_row([5.1, 3.5, 1.4, 0.2], "")],
            ScoringConfig::default(),
        );
        let mut sink = VecRowSink::new();
        scorer.run(&mut sink).unwrap();

        assert_eq!(sink.rows().len(), 1);
        let out = &sink.rows()[0];
        assert_eq!(out.len(), 6);
        assert_eq!(out[5], RowValue::Text("setosa".into()));

        let schema = scorer.output_schema().unwrap();
        assert_eq!(schema.fields.last().unwrap().name, "class_predicted");
    }

    #[test]
    fn probability_columns_for_iris() {
        let model = FixedDistributionClassifier::new(iris_schema(), vec![0.6, 0.3, 0.1]);
        let mut scorer = scorer_with(
            Box::new(model),
            vec![iris_row([5.1, 3.5, 1.4, 0.2], "")],
            ScoringConfig {
                output_probabilities: true,
                ..ScoringConfig::default()
            },
        );
        let mut sink = VecRowSink::new();
        scorer.run(&mut sink).unwrap();

        let out = &sink.rows()[0];
        assert_eq!(out.len(), 8);
        let sum: f64 = out[5..]
            .iter()
            .map(|v| match v {
                RowValue::Numeric(p) => *p,
                other => panic!("expected numeric probability, got {other:?}"),
            })
            .sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn missing_input_field_still_scores() {
        let schema = RowSchema::new(vec![
            Field::new("sepallength", FieldKind::Numeric),
            Field::new("sepalwidth", FieldKind::Numeric),
            Field::new("petallength", FieldKind::Numeric),
            // petalwidth absent entirely
        ]);
        let stream = VecRowStream::new(
            schema,
            vec![vec![
                RowValue::Numeric(5.1),
                RowValue::Numeric(3.5),
                RowValue::Numeric(1.4),
            ]],
        );
        let model = FixedDistributionClassifier::new(iris_schema(), vec![0.0, 1.0, 0.0]);
        let mut scorer = StreamScorer::new(
            Box::new(stream),
            ModelSource::Fixed(Box::new(model)),
            ScoringConfig::default(),
        );
        let mut sink = VecRowSink::new();
        scorer.run(&mut sink).unwrap();

        assert_eq!(sink.rows().len(), 1);
        assert_eq!(sink.rows()[0][3], RowValue::Text("versicolor".into()));
    }

    #[test]
    fn batch_and_row_at_a_time_agree() {
        let rows: Vec<Vec<RowValue>> = (0..7)
            .map(|i| iris_row([(i % 3) as f64, 0.0, 0.0, 0.0], ""))
            .collect();

        let mut row_sink = VecRowSink::new();
        scorer_with(
            Box::new(SlotVoteClassifier::new()),
            rows.clone(),
            ScoringConfig::default(),
        )
        .run(&mut row_sink)
        .unwrap();

        let mut batch_sink = VecRowSink::new();
        scorer_with(
            Box::new(SlotVoteClassifier::new().batch_capable()),
            rows,
            ScoringConfig {
                batch_size: Some("3".into()),
                ..ScoringConfig::default()
            },
        )
        .run(&mut batch_sink)
        .unwrap();

        assert_eq!(row_sink.rows(), batch_sink.rows());
    }

    #[test]
    fn end_of_stream_flushes_the_partial_batch() {
        let rows: Vec<Vec<RowValue>> = (0..5).map(|_| iris_row([0.0; 4], "")).collect();
        let mut sink = VecRowSink::new();
        let mut scorer = scorer_with(
            Box::new(SlotVoteClassifier::new().batch_capable()),
            rows,
            ScoringConfig {
                batch_size: Some("3".into()),
                ..ScoringConfig::default()
            },
        );
        scorer.run(&mut sink).unwrap();
        assert_eq!(sink.rows().len(), 5);
        assert_eq!(scorer.rows_read(), 5);
    }

    #[test]
    fn prediction_failure_names_the_row() {
        let rows = vec![iris_row([0.0; 4], ""), iris_row([1.0; 4], "")];
        let mut sink = VecRowSink::new();
        let err = scorer_with(
            Box::new(FailingModel::new()),
            rows,
            ScoringConfig::default(),
        )
        .run(&mut sink)
        .unwrap_err();
        assert!(matches!(err, ScoringError::RowPrediction { row: 1, .. }));
        assert!(sink.rows().is_empty());
    }

    struct ExplodingBatchModel {
        schema: std::sync::Arc<crate::core::model_schema::ModelSchema>,
    }

    impl ScoringModel for ExplodingBatchModel {
        fn schema(&self) -> &std::sync::Arc<crate::core::model_schema::ModelSchema> {
            &self.schema
        }

        fn is_supervised(&self) -> bool {
            true
        }

        fn is_batch_capable(&self) -> bool {
            true
        }

        fn distribution_for(&self, _i: &DenseInstance) -> Result<Vec<f64>, ModelError> {
            Ok(vec![1.0, 0.0, 0.0])
        }

        fn distribution_for_batch(
            &self,
            _instances: &[DenseInstance],
        ) -> Result<Vec<Vec<f64>>, ModelError> {
            Err(ModelError::Invocation("batch exploded".into()))
        }
    }

    #[test]
    fn batch_failure_covers_the_whole_buffer() {
        let rows: Vec<Vec<RowValue>> = (0..4).map(|_| iris_row([0.0; 4], "")).collect();
        let mut sink = VecRowSink::new();
        let err = scorer_with(
            Box::new(ExplodingBatchModel {
                schema: iris_schema(),
            }),
            rows,
            ScoringConfig {
                batch_size: Some("2".into()),
                ..ScoringConfig::default()
            },
        )
        .run(&mut sink)
        .unwrap_err();
        assert!(matches!(
            err,
            ScoringError::BatchPrediction {
                first_row: 1,
                last_row: 2,
                ..
            }
        ));
        assert!(sink.rows().is_empty());
    }

    #[test]
    fn incremental_update_counts_only_labeled_rows() {
        let (spy, handle) = UpdateSpyClassifier::new(iris_schema());
        let rows = vec![
            iris_row([1.0; 4], "setosa"),
            iris_row([1.0; 4], ""),
            iris_row([1.0; 4], "virginica"),
            iris_row([1.0; 4], "orchid"), // unseen label: missing target slot
        ];
        let mut sink = VecRowSink::new();
        scorer_with(
            Box::new(spy),
            rows,
            ScoringConfig {
                update_incremental_model: true,
                ..ScoringConfig::default()
            },
        )
        .run(&mut sink)
        .unwrap();
        assert_eq!(handle.count(), 2);
        assert_eq!(sink.rows().len(), 4);
    }

    #[test]
    fn update_failure_is_fatal() {
        let (spy, _handle) = UpdateSpyClassifier::new(iris_schema());
        let rows = vec![iris_row([1.0; 4], "setosa")];
        let mut sink = VecRowSink::new();
        let err = scorer_with(
            Box::new(spy.failing_updates()),
            rows,
            ScoringConfig {
                update_incremental_model: true,
                ..ScoringConfig::default()
            },
        )
        .run(&mut sink)
        .unwrap_err();
        assert!(matches!(err, ScoringError::UpdateFailed(_)));
    }

    #[test]
    fn raised_stop_flag_halts_before_any_row() {
        let rows: Vec<Vec<RowValue>> = (0..10).map(|_| iris_row([0.0; 4], "")).collect();
        let stop = Arc::new(AtomicBool::new(true));
        let model = FixedDistributionClassifier::new(iris_schema(), vec![1.0, 0.0, 0.0]);
        let mut scorer = scorer_with(Box::new(model), rows, ScoringConfig::default())
            .with_stop_flag(stop);
        let mut sink = VecRowSink::new();
        scorer.run(&mut sink).unwrap();
        assert_eq!(scorer.rows_read(), 0);
        assert!(sink.rows().is_empty());
    }

    struct FlagRaisingStream {
        inner: VecRowStream,
        stop: Arc<AtomicBool>,
        raise_after: u64,
        yielded: u64,
    }

    impl RowStream for FlagRaisingStream {
        fn schema(&self) -> &RowSchema {
            self.inner.schema()
        }

        fn has_more_rows(&self) -> bool {
            self.inner.has_more_rows()
        }

        fn next_row(&mut self) -> Option<Vec<RowValue>> {
            let row = self.inner.next_row();
            if row.is_some() {
                self.yielded += 1;
                if self.yielded >= self.raise_after {
                    self.stop.store(true, Ordering::Relaxed);
                }
            }
            row
        }
    }

    #[test]
    fn stop_mid_stream_flushes_buffered_rows() {
        let rows: Vec<Vec<RowValue>> = (0..5)
            .map(|i| iris_row([(i % 3) as f64, 0.0, 0.0, 0.0], ""))
            .collect();
        let stop = Arc::new(AtomicBool::new(false));
        let stream = FlagRaisingStream {
            inner: VecRowStream::new(iris_row_schema(), rows),
            stop: Arc::clone(&stop),
            raise_after: 2,
            yielded: 0,
        };
        let mut scorer = StreamScorer::new(
            Box::new(stream),
            ModelSource::Fixed(Box::new(SlotVoteClassifier::new().batch_capable())),
            ScoringConfig {
                batch_size: Some("4".into()),
                ..ScoringConfig::default()
            },
        )
        .with_stop_flag(stop);
        let mut sink = VecRowSink::new();
        scorer.run(&mut sink).unwrap();

        // both accepted rows sat in the batch buffer when the flag went up
        assert_eq!(scorer.rows_read(), 2);
        assert_eq!(sink.rows().len(), 2);
        assert_eq!(sink.rows()[0][5], RowValue::Text("setosa".into()));
        assert_eq!(sink.rows()[1][5], RowValue::Text("versicolor".into()));
    }

    struct PathProvider;

    impl ModelProvider for PathProvider {
        fn load(&mut self, resolved_path: &str) -> anyhow::Result<Box<dyn ScoringModel>> {
            let dist = match resolved_path {
                "always_setosa" => vec![1.0, 0.0, 0.0],
                _ => vec![0.0, 0.0, 1.0],
            };
            // batch-capable on purpose: field-sourced selection must still
            // disable batching
            Ok(Box::new(
                FixedDistributionClassifier::new(iris_schema(), dist).batch_capable(),
            ))
        }
    }

    #[test]
    fn field_sourced_models_score_row_by_row() {
        let schema = RowSchema::new(vec![
            Field::new("sepallength", FieldKind::Numeric),
            Field::new("sepalwidth", FieldKind::Numeric),
            Field::new("petallength", FieldKind::Numeric),
            Field::new("petalwidth", FieldKind::Numeric),
            Field::new("class", FieldKind::Text),
            Field::new("model_path", FieldKind::Text),
        ]);
        let mut rows = Vec::new();
        for path in ["always_setosa", "always_setosa", "other"] {
            let mut row = iris_row([1.0; 4], "");
            row.push(RowValue::Text(path.into()));
            rows.push(row);
        }
        let stream = VecRowStream::new(schema, rows);
        let mut scorer = StreamScorer::new(
            Box::new(stream),
            ModelSource::FromField {
                field_name: "model_path".into(),
                provider: Box::new(PathProvider),
                default_model: None,
                cache_loaded_models: false,
            },
            ScoringConfig::default(),
        );
        let mut sink = VecRowSink::new();
        scorer.run(&mut sink).unwrap();

        assert_eq!(sink.rows().len(), 3);
        assert_eq!(sink.rows()[0][6], RowValue::Text("setosa".into()));
        assert_eq!(sink.rows()[1][6], RowValue::Text("setosa".into()));
        assert_eq!(sink.rows()[2][6], RowValue::Text("virginica".into()));
    }

    #[test]
    fn unmapped_target_keeps_scoring_with_update_disabled() {
        let schema = RowSchema::new(vec![
            Field::new("sepallength", FieldKind::Numeric),
            Field::new("sepalwidth", FieldKind::Numeric),
            Field::new("petallength", FieldKind::Numeric),
            Field::new("petalwidth", FieldKind::Numeric),
        ]);
        let (spy, handle) = UpdateSpyClassifier::new(iris_schema());
        let stream = VecRowStream::new(
            schema,
            vec![vec![
                RowValue::Numeric(1.0),
                RowValue::Numeric(1.0),
                RowValue::Numeric(1.0),
                RowValue::Numeric(1.0),
            ]],
        );
        let mut scorer = StreamScorer::new(
            Box::new(stream),
            ModelSource::Fixed(Box::new(spy)),
            ScoringConfig {
                update_incremental_model: true,
                ..ScoringConfig::default()
            },
        );
        let mut sink = VecRowSink::new();
        scorer.run(&mut sink).unwrap();
        assert_eq!(sink.rows().len(), 1);
        assert_eq!(handle.count(), 0);
    }

    #[test]
    fn unlabeled_target_slot_on_missing_instance() {
        // a row whose target cell is null scores fine and leaves the slot
        // missing for the updater
        let model = FixedDistributionClassifier::new(iris_schema(), vec![0.5, 0.5, 0.0]);
        let mut scorer = scorer_with(
            Box::new(model),
            vec![iris_row([MISSING_VALUE; 4], "")],
            ScoringConfig::default(),
        );
        let mut sink = VecRowSink::new();
        scorer.run(&mut sink).unwrap();
        // tie between setosa and versicolor breaks to the first index
        assert_eq!(
            sink.rows()[0].last().unwrap(),
            &RowValue::Text("setosa".into())
        );
    }
}
