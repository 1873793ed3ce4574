use geomap_int_test::test_util::{
    cleanup, create_empty_test_context, create_roads_table, insert_geometry, road,
};
use geo::CoordsIter;
use geomap_spatial::{BoundingBox, SpatialError, SpatialResult, WEB_MERCATOR, WGS84};
use log::info;
use rusqlite::Connection;

fn execute(conn: &Connection, sql: &str) -> SpatialResult<()> {
    conn.execute_batch(sql).map_err(|source| SpatialError::QueryFailure {
        sql: sql.to_string(),
        source,
    })
}

fn main() -> SpatialResult<()> {
    geomap_int_test::test_util::init_logging();
    println!("Starting streaming stress test...");
    let ctx = create_empty_test_context()?;
    let db = ctx.db();

    let count = 200_000;
    let start = std::time::Instant::now();
    {
        let handler = db.lock();
        let conn = handler.connection()?;
        create_roads_table(conn, "roads", 4326);
        execute(conn, "BEGIN;")?;
        for i in 0..count {
            let offset = (i % 3_000) as f64 / 20.0 - 75.0;
            insert_geometry(conn, "roads", &road(offset));
        }
        execute(conn, "COMMIT;")?;
    }
    println!("Inserted {} roads in {:?}", count, start.elapsed());

    let world = BoundingBox::new(-180.0, -90.0, 180.0, 90.0);
    let handler = db.lock();
    let roads = handler.list_tables()?.remove(0);

    let start = std::time::Instant::now();
    let blobs = handler.fetch_all_wkb_in_bounds(WGS84, &roads, &world)?;
    let bytes: usize = blobs.iter().map(Vec::len).sum();
    println!(
        "Fetched {} blobs ({} bytes) eagerly in {:?}",
        blobs.len(),
        bytes,
        start.elapsed()
    );
    drop(blobs);

    let start = std::time::Instant::now();
    let mercator = BoundingBox::new(-2.0e7, -2.0e7, 2.0e7, 2.0e7);
    let (decoded, vertices) =
        handler.with_geometry_iterator(WEB_MERCATOR, &roads, &mercator, |geometries| {
            let mut vertices = 0usize;
            for geometry in geometries.by_ref() {
                match geometry {
                    Ok(geometry) => vertices += geometry.coords_count(),
                    Err(e) => info!("Skipping row: {}", e),
                }
            }
            (geometries.produced(), vertices)
        })?;
    println!(
        "Streamed {} reprojected geometries ({} vertices) in {:?}",
        decoded,
        vertices,
        start.elapsed()
    );
    drop(handler);

    cleanup(ctx)
}
