use geo_types::line_string;
use geomap_spatial::test_support;
use geomap_spatial::{
    Geometry, GeometryCodec, SharedSpatialDatabase, SpatialDatabaseHandler, SpatialResult,
    WkbCodec,
};
use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;
use std::backtrace::Backtrace;
use std::path::Path;
use std::time::{Duration, Instant};
use std::{env, fs, thread};

/// Version string reported by the stand-in `spatialite_version()`.
pub const TEST_SPATIALITE_VERSION: &str = "5.1.0-test";

/// Runs a test with retry logic and error handling.
/// Tests run on the current thread to avoid thread exhaustion when running many tests in parallel.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> SpatialResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    B: Fn() -> SpatialResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> SpatialResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    const MAX_RETRIES: u32 = 3;
    let mut last_error: Option<String> = None;
    let mut last_backtrace: Option<String> = None;

    init_logging();

    for attempt in 1..=MAX_RETRIES {
        let start_time = Instant::now();

        let result = std::panic::catch_unwind(|| {
            let backtrace = Backtrace::capture();
            match before() {
                Ok(ctx) => match test(ctx.clone()) {
                    Ok(_) => match after(ctx) {
                        Ok(_) => Ok(()),
                        Err(e) => Err((
                            format!("After run failed: {:?}", e),
                            backtrace.to_string(),
                        )),
                    },
                    Err(e) => {
                        let _ = after(ctx);
                        Err((format!("Test failed: {:?}", e), backtrace.to_string()))
                    }
                },
                Err(e) => Err((format!("Before run failed: {:?}", e), backtrace.to_string())),
            }
        });

        let elapsed = start_time.elapsed();

        match result {
            Ok(Ok(_)) => return,
            Ok(Err((e, bt))) => {
                if attempt < MAX_RETRIES {
                    eprintln!(
                        "\n========== Test Attempt {}/{} Failed (took {:?}) ==========",
                        attempt, MAX_RETRIES, elapsed
                    );
                    eprintln!("Error: {}", e);
                    thread::sleep(Duration::from_millis(100 * attempt as u64));
                }
                last_error = Some(e);
                last_backtrace = Some(bt);
            }
            Err(panic_err) => {
                let err_msg = if let Some(s) = panic_err.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_err.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };

                if attempt < MAX_RETRIES {
                    eprintln!(
                        "\n========== Test Attempt {}/{} Panicked (took {:?}) ==========",
                        attempt, MAX_RETRIES, elapsed
                    );
                    eprintln!("Panic: {}", err_msg);
                    thread::sleep(Duration::from_millis(100 * attempt as u64));
                }
                last_error = Some(format!("Panic: {}", err_msg));
                last_backtrace = Some(Backtrace::capture().to_string());
            }
        }
    }

    eprintln!("\n==================== TEST FAILED ====================");
    eprintln!("Failed after {} attempts", MAX_RETRIES);
    eprintln!("Last error: {}", last_error.as_deref().unwrap_or("Unknown"));
    if let Some(bt) = &last_backtrace {
        if !bt.is_empty() && !bt.contains("disabled") {
            eprintln!("\nBacktrace:\n{}", bt);
        }
    }
    eprintln!("=====================================================\n");

    panic!(
        "Test failed after {} attempts. Last error: {}",
        MAX_RETRIES,
        last_error.unwrap_or_default()
    );
}

/// Installs `env_logger` once; later calls are ignored.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Clone)]
pub struct TestContext {
    path: String,
    db: SharedSpatialDatabase,
}

impl TestContext {
    pub fn new(path: String, db: SharedSpatialDatabase) -> Self {
        Self { path, db }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn db(&self) -> SharedSpatialDatabase {
        self.db.clone()
    }
}

pub fn random_path() -> String {
    let id = uuid::Uuid::new_v4();
    env::temp_dir()
        .join(format!("{}.sqlite", id))
        .to_string_lossy()
        .into_owned()
}

/// A database with a legacy geometry registry and no spatial tables.
pub fn create_empty_test_context() -> SpatialResult<TestContext> {
    let path = random_path();
    let handler = SpatialDatabaseHandler::open(&path)?;
    {
        let conn = handler.connection()?;
        create_registry(conn);
        register_spatial_functions(conn);
    }
    Ok(TestContext::new(path, SharedSpatialDatabase::new(handler)))
}

/// A database with a `roads` table of `count` short roads in WGS 84, the
/// n-th starting at `(n, n)` degrees.
pub fn create_roads_test_context(count: usize) -> SpatialResult<TestContext> {
    let ctx = create_empty_test_context()?;
    {
        let db = ctx.db();
        let handler = db.lock();
        let conn = handler.connection()?;
        create_roads_table(conn, "roads", 4326);
        for i in 0..count {
            let start = i as f64;
            insert_geometry(conn, "roads", &road(start));
        }
    }
    Ok(ctx)
}

pub fn road(start: f64) -> Geometry {
    line_string![
        (x: start, y: start),
        (x: start + 0.5, y: start + 0.25),
        (x: start + 0.75, y: start + 0.5),
    ]
    .into()
}

/// Closes the handler and removes the database file.
pub fn cleanup(ctx: TestContext) -> SpatialResult<()> {
    ctx.db().lock().close();

    let path = Path::new(ctx.path());
    for retry in 0..5u64 {
        match fs::remove_file(path) {
            Ok(_) => break,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => break,
            Err(e) if retry == 4 => {
                eprintln!("Warning: Failed to remove test database {:?}: {:?}", path, e);
            }
            Err(_) => thread::sleep(Duration::from_millis(50 * (retry + 1))),
        }
    }
    Ok(())
}

/// Creates the legacy `geometry_columns` registry.
pub fn create_registry(conn: &Connection) {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS geometry_columns (
            f_table_name TEXT NOT NULL,
            f_geometry_column TEXT NOT NULL,
            type TEXT NOT NULL,
            coord_dimension INTEGER NOT NULL,
            srid INTEGER,
            spatial_index_enabled INTEGER NOT NULL);",
    )
    .expect("create geometry_columns");
}

/// Creates a geometry table and registers it.
pub fn create_roads_table(conn: &Connection, name: &str, srid: i64) {
    conn.execute_batch(&format!(
        "CREATE TABLE \"{}\" (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT, geom BLOB);",
        name
    ))
    .expect("create geometry table");
    conn.execute(
        "INSERT INTO geometry_columns VALUES (?1, 'geom', 'LINESTRING', 2, ?2, 0)",
        rusqlite::params![name, srid],
    )
    .expect("register geometry table");
}

pub fn insert_geometry(conn: &Connection, table: &str, geometry: &Geometry) {
    let wkb = WkbCodec::new().encode(geometry).expect("encode geometry");
    conn.execute(
        &format!("INSERT INTO \"{}\" (geom) VALUES (?1)", table),
        [wkb],
    )
    .expect("insert geometry");
}

/// Registers the spatial function stand-ins plus the version queries:
/// `spatialite_version()` returns [`TEST_SPATIALITE_VERSION`] and
/// `proj4_version()` returns NULL. `geos_version()` is left unregistered.
pub fn register_spatial_functions(conn: &Connection) {
    test_support::register_spatial_functions(conn).expect("register spatial functions");

    conn.create_scalar_function("spatialite_version", 0, FunctionFlags::SQLITE_UTF8, |_| {
        Ok(TEST_SPATIALITE_VERSION)
    })
    .expect("register spatialite_version");

    conn.create_scalar_function("proj4_version", 0, FunctionFlags::SQLITE_UTF8, |_| {
        Ok(None::<String>)
    })
    .expect("register proj4_version");
}
