#[cfg(feature = "gpu")]
mod parity {
    use std::sync::Arc;

    use fractale::{
        AcceleratorBackend, AcceleratorContext, AcceleratorSettings, BackendKind,
        BackendSettings, Classification, Dimensions, DrawBackend, FractaleError, KernelSource,
        PlanePoint, SequentialBackend, Viewport, classify, create_backend,
    };

    fn context_with(settings: &AcceleratorSettings) -> Option<AcceleratorContext> {
        match AcceleratorContext::new(settings) {
            Ok(ctx) => Some(ctx),
            Err(e) if no_device(&e) => None,
            Err(e) => panic!("unexpected accelerator init error: {e}"),
        }
    }

    fn no_device(e: &FractaleError) -> bool {
        let msg = e.to_string();
        msg.contains("no gpu adapter available") || msg.contains("does not support compute")
    }

    fn cardioid_view() -> Viewport {
        Viewport::new(PlanePoint::new(-0.5, 0.3), PlanePoint::new(0.2, -0.3)).unwrap()
    }

    fn assert_close(seq: &[f32], gpu: &[f32]) {
        assert_eq!(seq.len(), gpu.len());
        for (idx, (a, b)) in seq.iter().zip(gpu).enumerate() {
            assert!(a.is_finite() && b.is_finite(), "pixel {idx}: {a} vs {b}");
            let tol = 1e-3 * a.abs().max(1e-3);
            assert!((a - b).abs() <= tol, "pixel {idx}: {a} vs {b}");
        }
    }

    #[test]
    fn accelerator_matches_sequential_inside_the_set() {
        let Some(ctx) = context_with(&AcceleratorSettings::default()) else {
            return;
        };
        let dims = Dimensions::new(16, 8).unwrap();
        let vp = cardioid_view();

        let seq = SequentialBackend::new().render(dims, &vp).unwrap();
        let mut gpu = AcceleratorBackend::new(Arc::new(ctx));
        let out = gpu.render(dims, &vp).unwrap();
        assert_close(&seq.data, &out.data);
    }

    #[test]
    fn sizes_off_the_work_group_grid_are_padded() {
        let Some(ctx) = context_with(&AcceleratorSettings::default()) else {
            return;
        };
        let mut gpu = AcceleratorBackend::new(Arc::new(ctx));
        let vp = cardioid_view();
        for (w, h) in [(13, 7), (1, 1), (65, 1)] {
            let dims = Dimensions::new(w, h).unwrap();
            let seq = SequentialBackend::new().render(dims, &vp).unwrap();
            let out = gpu.render(dims, &vp).unwrap();
            assert_close(&seq.data, &out.data);
        }
    }

    #[test]
    fn classic_view_classifies_like_sequential() {
        let Some(ctx) = context_with(&AcceleratorSettings::default()) else {
            return;
        };
        let dims = Dimensions::new(192, 64).unwrap();
        let vp = Viewport::new(PlanePoint::new(-2.0, 1.0), PlanePoint::new(2.0, -1.0)).unwrap();

        let seq = SequentialBackend::new().render(dims, &vp).unwrap();
        let out = AcceleratorBackend::new(Arc::new(ctx))
            .render(dims, &vp)
            .unwrap();

        assert!(out.get(96, 32).unwrap() <= 1.0);
        for (i, j) in [(0, 0), (191, 63), (191, 0), (0, 63)] {
            assert_eq!(classify(out.get(i, j).unwrap()), Classification::Divergent);
        }

        // Chaotic pixels on the set boundary may legitimately flip between classes.
        let agree = seq
            .data
            .iter()
            .zip(&out.data)
            .filter(|(a, b)| classify(**a) == classify(**b))
            .count();
        assert!(agree * 100 >= seq.data.len() * 97, "{agree} / {}", seq.data.len());
    }

    #[test]
    fn repeated_dispatches_are_identical() {
        let Some(ctx) = context_with(&AcceleratorSettings::default()) else {
            return;
        };
        let dims = Dimensions::new(32, 8).unwrap();
        let vp = Viewport::new(PlanePoint::new(-2.0, 1.0), PlanePoint::new(1.0, -1.0)).unwrap();
        let mut a = vec![0.0f32; dims.pixel_count()];
        let mut b = vec![1.0f32; dims.pixel_count()];
        ctx.dispatch(&mut a, dims, &vp).unwrap();
        ctx.dispatch(&mut b, dims, &vp).unwrap();
        assert!(
            a.iter()
                .zip(&b)
                .all(|(x, y)| x.to_bits() == y.to_bits() || (x.is_nan() && y.is_nan()))
        );
        ctx.release();
    }

    #[test]
    fn shared_context_serves_several_threads() {
        let Some(ctx) = context_with(&AcceleratorSettings::default()) else {
            return;
        };
        let ctx = Arc::new(ctx);
        let dims = Dimensions::new(16, 8).unwrap();
        let vp = cardioid_view();

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let mut backend = AcceleratorBackend::new(Arc::clone(&ctx));
                std::thread::spawn(move || backend.render(dims, &vp).unwrap())
            })
            .collect();
        let rasters: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for r in &rasters[1..] {
            assert_eq!(r.data, rasters[0].data);
        }
    }

    #[test]
    fn mismatched_raster_is_rejected_and_untouched() {
        let Some(ctx) = context_with(&AcceleratorSettings::default()) else {
            return;
        };
        let dims = Dimensions::new(8, 8).unwrap();
        let mut dest = vec![3.0f32; 63];
        let err = ctx.dispatch(&mut dest, dims, &cardioid_view()).unwrap_err();
        assert!(matches!(err, FractaleError::Validation(_)));
        assert!(dest.iter().all(|v| *v == 3.0));
    }

    #[test]
    fn oversized_raster_is_recoverable_and_context_survives() {
        let Some(ctx) = context_with(&AcceleratorSettings {
            max_buffer_bytes: Some(64 * 1024),
            ..Default::default()
        }) else {
            return;
        };
        let over = ctx.max_raster_bytes() / 4 + 1;
        if over > 1 << 22 {
            // The device ignored the cap; a raster that large is too costly to allocate here.
            return;
        }
        let dims = Dimensions::new(over as u32, 1).unwrap();
        let mut dest = vec![7.0f32; dims.pixel_count()];
        let err = ctx.dispatch(&mut dest, dims, &cardioid_view()).unwrap_err();
        assert!(matches!(err, FractaleError::Dispatch(_)), "{err}");
        assert!(err.is_recoverable());
        assert!(dest.iter().all(|v| *v == 7.0));

        let dims = Dimensions::new(16, 8).unwrap();
        let mut dest = vec![7.0f32; dims.pixel_count()];
        ctx.dispatch(&mut dest, dims, &cardioid_view()).unwrap();
        assert!(dest.iter().all(|v| *v <= 1.0));
    }

    #[test]
    fn broken_kernel_reports_the_build_log() {
        let dir = std::path::PathBuf::from("target").join("parity");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("broken.wgsl");
        std::fs::write(&path, "@compute @workgroup_size(64)\nfn mandelbrot( {\n").unwrap();

        let settings = AcceleratorSettings {
            kernel: KernelSource::File(path),
            ..Default::default()
        };
        match AcceleratorContext::new(&settings) {
            Ok(_) => panic!("broken kernel compiled"),
            Err(e) if no_device(&e) => {}
            Err(e) => {
                assert!(matches!(e, FractaleError::DeviceInit(_)));
                assert!(!e.is_recoverable());
                assert!(e.to_string().contains("unable to build kernel program"));
            }
        }
    }

    #[test]
    fn missing_entry_point_fails_init() {
        let dir = std::path::PathBuf::from("target").join("parity");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("renamed.wgsl");
        let src = fractale::program::EMBEDDED_WGSL.replace("fn mandelbrot(", "fn julia(");
        std::fs::write(&path, src).unwrap();

        let settings = AcceleratorSettings {
            kernel: KernelSource::File(path),
            ..Default::default()
        };
        match AcceleratorContext::new(&settings) {
            Ok(_) => panic!("kernel without entry point built"),
            Err(e) if no_device(&e) => {}
            Err(e) => assert!(matches!(e, FractaleError::DeviceInit(_))),
        }
    }

    #[test]
    fn facade_builds_the_accelerator() {
        let mut backend =
            match create_backend(BackendKind::Accelerator, &BackendSettings::default()) {
                Ok(b) => b,
                Err(e) if no_device(&e) => return,
                Err(e) => panic!("unexpected accelerator init error: {e}"),
            };
        assert_eq!(backend.name(), "accelerator");
        let dims = Dimensions::new(8, 8).unwrap();
        let raster = backend.render(dims, &cardioid_view()).unwrap();
        assert!(raster.data.iter().all(|v| *v <= 1.0));
    }
}
