use criterion::{
    criterion_group, criterion_main, AxisScale, BenchmarkId, Criterion, PlotConfiguration,
    Throughput,
};
use h5cf::{
    config::Config,
    container::{MemoryContainer, MemoryContainerBuilder, MemoryDataset},
    datatype::Datatype,
    normalize::normalize,
};

/// A dimension scale file with `num_groups` groups of three variables sharing two scales.
fn dimension_scale_container(num_groups: usize) -> MemoryContainer {
    let mut builder = MemoryContainerBuilder::new();
    for group in 0..num_groups {
        let y = format!("/g{group}/y");
        let x = format!("/g{group}/x");
        builder = builder
            .group(&format!("/g{group}"))
            .unwrap()
            .dataset(&y, MemoryDataset::dimension_scale(Datatype::Float32, 180))
            .unwrap()
            .dataset(&x, MemoryDataset::dimension_scale(Datatype::Float32, 360))
            .unwrap();
        for var in ["a", "b", "c"] {
            builder = builder
                .dataset(
                    &format!("/g{group}/{var}"),
                    MemoryDataset::simple(Datatype::Float32, &[180, 360])
                        .with_dimension_scales(&[y.as_str(), x.as_str()])
                        .unwrap(),
                )
                .unwrap();
        }
    }
    builder.build()
}

/// A file matching no pattern with `num_vars` variables of distinct shapes.
fn fallback_container(num_vars: usize) -> MemoryContainer {
    let mut builder = MemoryContainerBuilder::new();
    for var in 0..num_vars {
        let size = var as u64 + 1;
        builder = builder
            .dataset(
                &format!("/v{var}"),
                MemoryDataset::simple(Datatype::Int16, &[size, size + 1]),
            )
            .unwrap();
    }
    builder.build()
}

fn normalize_files(c: &mut Criterion) {
    let plot_config = PlotConfiguration::default().summary_scale(AxisScale::Logarithmic);
    let mut group = c.benchmark_group("normalize");
    group.plot_config(plot_config);
    let config = Config::default();

    for num_groups in [1, 10, 100] {
        let container = dimension_scale_container(num_groups);
        group.throughput(Throughput::Elements(num_groups as u64 * 5));
        group.bench_function(BenchmarkId::new("dimension_scale", num_groups), |b| {
            b.iter(|| normalize(&container, &config).unwrap());
        });
    }

    for num_vars in [10, 100, 1000] {
        let container = fallback_container(num_vars);
        group.throughput(Throughput::Elements(num_vars as u64));
        group.bench_function(BenchmarkId::new("fallback", num_vars), |b| {
            b.iter(|| normalize(&container, &config).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, normalize_files);
criterion_main!(benches);
