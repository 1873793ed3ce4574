use geomap_int_test::test_util::{
    cleanup, create_empty_test_context, create_roads_table, create_roads_test_context, run_test,
};
use geomap_spatial::{GeometryKind, SpatialTableCatalog, WEB_MERCATOR, WGS84};

#[test]
fn test_empty_registry_lists_no_tables() {
    run_test(
        || create_empty_test_context(),
        |ctx| {
            ctx.db().with_handler(|handler| {
                assert!(handler.list_tables()?.is_empty());
                assert!(handler.catalog()?.is_empty());
                Ok(())
            })
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_lists_registered_tables_in_order() {
    run_test(
        || create_roads_test_context(0),
        |ctx| {
            ctx.db().with_handler(|handler| {
                let conn = handler.connection()?;
                create_roads_table(conn, "trails", 3857);
                create_roads_table(conn, "ferry lines", 4326);

                let tables = handler.list_tables()?;
                let names: Vec<&str> = tables.iter().map(|t| t.name()).collect();
                assert_eq!(names, vec!["roads", "trails", "ferry lines"]);
                assert_eq!(tables[0].srid(), WGS84);
                assert_eq!(tables[1].srid(), WEB_MERCATOR);
                assert!(tables
                    .iter()
                    .all(|t| t.kind() == Some(GeometryKind::LineString)));
                assert!(tables.iter().all(|t| t.geometry_column() == "geom"));
                Ok(())
            })
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_catalog_is_a_snapshot() {
    run_test(
        || create_roads_test_context(0),
        |ctx| {
            ctx.db().with_handler(|handler| {
                let catalog: SpatialTableCatalog = handler.catalog()?;
                create_roads_table(handler.connection()?, "rivers", 4326);

                assert_eq!(catalog.len(), 1);
                assert!(catalog.find("rivers").is_none());
                assert_eq!(handler.catalog()?.len(), 2);
                Ok(())
            })
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_missing_registry_is_query_failure() {
    run_test(
        || create_empty_test_context(),
        |ctx| {
            ctx.db().with_handler(|handler| {
                handler
                    .connection()?
                    .execute_batch("DROP TABLE geometry_columns;")
                    .expect("drop registry");
                let err = handler.list_tables().unwrap_err();
                assert!(err.is_query_failure());
                Ok(())
            })
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_current_registry_layout() {
    run_test(
        || create_empty_test_context(),
        |ctx| {
            ctx.db().with_handler(|handler| {
                handler
                    .connection()?
                    .execute_batch(
                        "DROP TABLE geometry_columns;
                         CREATE TABLE geometry_columns (
                            f_table_name TEXT NOT NULL, f_geometry_column TEXT NOT NULL,
                            geometry_type INTEGER NOT NULL, coord_dimension INTEGER NOT NULL,
                            srid INTEGER NOT NULL, spatial_index_enabled INTEGER NOT NULL);
                         INSERT INTO geometry_columns VALUES ('parcels', 'shape', 6, 2, 32632, 1);
                         INSERT INTO geometry_columns VALUES ('wells', 'geom', 1001, 3, 4326, 0);",
                    )
                    .expect("create current registry");

                let tables = handler.list_tables()?;
                assert_eq!(tables.len(), 2);
                assert_eq!(tables[0].geometry_type(), "MULTIPOLYGON");
                assert_eq!(tables[0].geometry_column(), "shape");
                assert_eq!(tables[0].srid().code(), 32632);
                assert_eq!(tables[1].geometry_type(), "POINT Z");
                assert_eq!(tables[1].kind(), Some(GeometryKind::Point));
                Ok(())
            })
        },
        |ctx| cleanup(ctx),
    )
}
