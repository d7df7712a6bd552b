//! Shared test utilities for the linfix crates.

pub mod tracing {
    //! A `tracing` layer that captures spans and events for assertions.
    use std::collections::HashMap;
    use std::fmt;
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

    use tracing::field::{Field, Visit};
    use tracing::span::{Attributes, Id, Record};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::Layer;
    use tracing_subscriber::layer::Context;
    use tracing_subscriber::registry::LookupSpan;

    /// Layer that keeps every closed span and emitted event so tests can
    /// assert on fixture-generation instrumentation.
    ///
    /// # Examples
    /// ```
    /// use linfix_test_support::tracing::RecordingLayer;
    /// use tracing_subscriber::layer::SubscriberExt;
    ///
    /// let layer = RecordingLayer::default();
    /// let subscriber = tracing_subscriber::registry().with(layer.clone());
    /// tracing::subscriber::with_default(subscriber, || {
    ///     let _span = tracing::info_span!("demo", rows = 5).entered();
    ///     tracing::info!(count = 1, "done");
    /// });
    /// assert_eq!(layer.spans()[0].fields.get("rows"), Some(&"5".to_owned()));
    /// assert_eq!(layer.events()[0].fields.get("count"), Some(&"1".to_owned()));
    /// ```
    #[derive(Clone, Default)]
    pub struct RecordingLayer {
        spans: Arc<Mutex<Vec<SpanRecord>>>,
        events: Arc<Mutex<Vec<EventRecord>>>,
    }

    impl RecordingLayer {
        /// Closed spans, in the order they closed.
        #[must_use]
        pub fn spans(&self) -> Vec<SpanRecord> {
            lock(&self.spans).clone()
        }

        /// Emitted events, in emission order.
        #[must_use]
        pub fn events(&self) -> Vec<EventRecord> {
            lock(&self.events).clone()
        }

        /// Returns the first closed span called `name`.
        #[must_use]
        pub fn span_named(&self, name: &str) -> Option<SpanRecord> {
            lock(&self.spans)
                .iter()
                .find(|span| span.name == name)
                .cloned()
        }
    }

    fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A closed span with its name and final field values.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SpanRecord {
        /// Span name from the callsite metadata.
        pub name: String,
        /// Field values, rendered as strings.
        pub fields: HashMap<String, String>,
    }

    /// An emitted event with its level, target, and field values.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct EventRecord {
        /// Event level.
        pub level: Level,
        /// Event target.
        pub target: String,
        /// Field values, rendered as strings; the message lives under
        /// `message`.
        pub fields: HashMap<String, String>,
    }

    impl<S> Layer<S> for RecordingLayer
    where
        S: Subscriber + for<'span> LookupSpan<'span>,
    {
        fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
            let Some(span) = ctx.span(id) else {
                return;
            };
            let mut record = SpanRecord {
                name: attrs.metadata().name().to_owned(),
                fields: HashMap::new(),
            };
            attrs.record(&mut Collect(&mut record.fields));
            span.extensions_mut().insert(record);
        }

        fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
            let Some(span) = ctx.span(id) else {
                return;
            };
            if let Some(record) = span.extensions_mut().get_mut::<SpanRecord>() {
                values.record(&mut Collect(&mut record.fields));
            }
        }

        fn on_close(&self, id: Id, ctx: Context<'_, S>) {
            let Some(span) = ctx.span(&id) else {
                return;
            };
            if let Some(record) = span.extensions_mut().remove::<SpanRecord>() {
                lock(&self.spans).push(record);
            }
        }

        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut fields = HashMap::new();
            event.record(&mut Collect(&mut fields));
            lock(&self.events).push(EventRecord {
                level: *event.metadata().level(),
                target: event.metadata().target().to_owned(),
                fields,
            });
        }
    }

    struct Collect<'a>(&'a mut HashMap<String, String>);

    impl Visit for Collect<'_> {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            self.0.insert(field.name().to_owned(), format!("{value:?}"));
        }

        fn record_str(&mut self, field: &Field, value: &str) {
            self.0.insert(field.name().to_owned(), value.to_owned());
        }

        fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
            self.0.insert(field.name().to_owned(), value.to_string());
        }

        fn record_f64(&mut self, field: &Field, value: f64) {
            self.0.insert(field.name().to_owned(), value.to_string());
        }

        fn record_u64(&mut self, field: &Field, value: u64) {
            self.0.insert(field.name().to_owned(), value.to_string());
        }

        fn record_i64(&mut self, field: &Field, value: i64) {
            self.0.insert(field.name().to_owned(), value.to_string());
        }

        fn record_bool(&mut self, field: &Field, value: bool) {
            self.0.insert(field.name().to_owned(), value.to_string());
        }
    }
}

pub mod fixtures {
    //! Helpers for inspecting fixture files written during tests.
    use std::path::Path;
    use std::{fs, io};

    /// Reads `path` and returns its header lines: the lines that consist of
    /// one or two integers and introduce a matrix or vector block.
    ///
    /// # Errors
    /// Returns the underlying I/O error when the file cannot be read.
    ///
    /// # Examples
    /// ```
    /// use linfix_test_support::fixtures::header_lines;
    ///
    /// let dir = std::env::temp_dir().join("linfix-header-lines-doc");
    /// std::fs::create_dir_all(&dir).expect("temp dir");
    /// let path = dir.join("f.test");
    /// std::fs::write(&path, "2 2\n1.0 0.0 \n0.0 1.0 \n2\n1.0 2.0 \n").expect("write");
    /// assert_eq!(header_lines(&path).expect("read"), vec!["2 2", "2"]);
    /// ```
    pub fn header_lines(path: &Path) -> io::Result<Vec<String>> {
        let text = fs::read_to_string(path)?;
        Ok(text
            .lines()
            .filter(|line| is_header(line))
            .map(ToOwned::to_owned)
            .collect())
    }

    fn is_header(line: &str) -> bool {
        let tokens: Vec<&str> = line.split_ascii_whitespace().collect();
        matches!(tokens.len(), 1 | 2)
            && tokens
                .iter()
                .all(|token| !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()))
    }

    #[cfg(test)]
    mod tests {
        use super::is_header;

        use rstest::rstest;

        #[rstest]
        #[case("3 3", true)]
        #[case("3", true)]
        #[case("0.5 0.25 ", false)]
        #[case("1.0 ", false)]
        #[case("1 2 3", false)]
        fn recognises_header_lines(#[case] line: &str, #[case] expected: bool) {
            assert_eq!(is_header(line), expected);
        }
    }
}
