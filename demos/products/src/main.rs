// =============================================================================
// Product Catalog Image Classification — Bazaar
// =============================================================================
//
// Trains a small linear classifier on product photos listed in a CSV
// manifest (`id,category`). Without --data-dir the demo writes a synthetic
// catalog of color-tinted tiles first, so it runs out of the box.
//
// Pipeline demonstrated:
//   1. Manifest parsing and label encoding
//   2. ProductImageDataset (shorter-side resize → center crop → normalize)
//   3. Seeded train/validation split with flip augmentation on train
//   4. Manual training loop: forward → loss → zero_grad → backward → step
//   5. ScalarRecorder streams with JSONL export
//   6. Confusion matrix table/heatmap and loss-curve plot
//
// Usage:
//   cargo run -p products-demo                                # synthetic catalog
//   cargo run -p products-demo -- --data-dir path/to/catalog  # real images
//   cargo run -p products-demo -- --epochs 25 --lr 0.05

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use bazaar::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

struct Config {
    data_dir: Option<String>,
    out_dir: String,
    epochs: usize,
    batch_size: usize,
    lr: f32,
    seed: u64,
    per_class: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            out_dir: "products-demo-out".to_string(),
            epochs: 12,
            batch_size: 16,
            lr: 0.1,
            seed: 37,
            per_class: 30,
        }
    }
}

fn parse_args() -> Config {
    let mut cfg = Config::default();
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--data-dir" => {
                i += 1;
                cfg.data_dir = Some(args[i].clone());
            }
            "--out-dir" => {
                i += 1;
                cfg.out_dir = args[i].clone();
            }
            "--epochs" => {
                i += 1;
                cfg.epochs = args[i].parse().expect("invalid --epochs");
            }
            "--batch-size" => {
                i += 1;
                cfg.batch_size = args[i].parse().expect("invalid --batch-size");
            }
            "--lr" => {
                i += 1;
                cfg.lr = args[i].parse().expect("invalid --lr");
            }
            "--seed" => {
                i += 1;
                cfg.seed = args[i].parse().expect("invalid --seed");
            }
            "--per-class" => {
                i += 1;
                cfg.per_class = args[i].parse().expect("invalid --per-class");
            }
            "--help" | "-h" => {
                println!("Product image classification demo for Bazaar");
                println!();
                println!("Options:");
                println!("  --data-dir <path>   Catalog with manifest.csv and <id>_resized.jpg files");
                println!("  --out-dir <path>    Where plots and scalars land (default: products-demo-out)");
                println!("  --epochs <n>        Number of training epochs (default: 12)");
                println!("  --batch-size <n>    Batch size (default: 16)");
                println!("  --lr <f>            Learning rate (default: 0.1)");
                println!("  --seed <n>          Split/shuffle/augmentation seed (default: 37)");
                println!("  --per-class <n>     Synthetic images per category (default: 30)");
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                std::process::exit(1);
            }
        }
        i += 1;
    }
    cfg
}

// ─────────────────────────────────────────────────────────────────────────────
// Synthetic catalog
// ─────────────────────────────────────────────────────────────────────────────

const SYNTHETIC_CLASSES: [(&str, [f64; 3]); 4] = [
    ("bags", [190.0, 60.0, 50.0]),
    ("jewelry", [210.0, 180.0, 70.0]),
    ("shoes", [60.0, 170.0, 70.0]),
    ("watches", [55.0, 90.0, 200.0]),
];

/// Writes `per_class` noisy color tiles per category plus a manifest CSV,
/// and returns the catalog directory.
fn write_synthetic_catalog(
    root: &Path,
    per_class: usize,
    seed: u64,
) -> Result<PathBuf, Box<dyn Error>> {
    let dir = root.join("synthetic-catalog");
    fs::create_dir_all(&dir)?;

    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 18.0)?;
    let mut csv = String::from("id,category\n");
    let mut idx = 0usize;

    for (label, base) in SYNTHETIC_CLASSES {
        for _ in 0..per_class {
            let id = format!("p{idx:04}");
            let jitter: [f64; 3] = [rng.gen_range(-20.0..20.0); 3];
            let tile = image::RgbImage::from_fn(72, 72, |_, _| {
                let mut px = [0u8; 3];
                for c in 0..3 {
                    let v = base[c] + jitter[c] + noise.sample(&mut rng);
                    px[c] = v.clamp(0.0, 255.0) as u8;
                }
                image::Rgb(px)
            });
            tile.save(dir.join(format!("{id}_resized.jpg")))?;
            csv.push_str(&format!("{id},{label}\n"));
            idx += 1;
        }
    }
    fs::write(dir.join("manifest.csv"), csv)?;
    Ok(dir)
}

// ─────────────────────────────────────────────────────────────────────────────
// Model: linear classifier over per-channel pixel means
// ─────────────────────────────────────────────────────────────────────────────

/// For each sample the model reduces the normalized CHW pixels to three
/// channel means, then applies `logits = W m + b`. Tiny, but enough to
/// separate color-coded product categories and to exercise the full loop.
struct ChannelMeanClassifier {
    classes: usize,
    w: Vec<f32>,
    b: Vec<f32>,
    grad_w: Vec<f32>,
    grad_b: Vec<f32>,
    cached: Vec<[f32; 3]>,
}

impl ChannelMeanClassifier {
    fn new(classes: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let init = Normal::new(0.0f32, 0.1).unwrap();
        ChannelMeanClassifier {
            classes,
            w: (0..classes * 3).map(|_| init.sample(&mut rng)).collect(),
            b: vec![0.0; classes],
            grad_w: vec![0.0; classes * 3],
            grad_b: vec![0.0; classes],
            cached: Vec::new(),
        }
    }

    fn num_params(&self) -> usize {
        self.w.len() + self.b.len()
    }

    fn features(batch: &Batch) -> Vec<[f32; 3]> {
        let plane = batch.sample_shape[1] * batch.sample_shape[2];
        (0..batch.len())
            .map(|i| {
                let pixels = batch.sample_pixels(i);
                let mut means = [0.0f32; 3];
                for (c, mean) in means.iter_mut().enumerate() {
                    *mean = pixels[c * plane..(c + 1) * plane].iter().sum::<f32>()
                        / plane as f32;
                }
                means
            })
            .collect()
    }
}

impl Model for ChannelMeanClassifier {
    fn forward(&mut self, batch: &Batch, mode: Mode) -> bazaar::train::Result<Logits> {
        let feats = Self::features(batch);
        let mut values = Vec::with_capacity(batch.len() * self.classes);
        for f in &feats {
            for k in 0..self.classes {
                let mut v = self.b[k];
                for c in 0..3 {
                    v += self.w[k * 3 + c] * f[c];
                }
                values.push(v);
            }
        }
        if mode.is_train() {
            self.cached = feats;
        }
        Ok(Logits::new(values, batch.len(), self.classes))
    }

    fn backward(&mut self, grad: &Logits) -> bazaar::train::Result<()> {
        if self.cached.len() != grad.batch() {
            return Err(TrainError::msg("backward without a training forward"));
        }
        for (i, f) in self.cached.iter().enumerate() {
            for k in 0..self.classes {
                let g = grad.row(i)[k];
                self.grad_b[k] += g;
                for c in 0..3 {
                    self.grad_w[k * 3 + c] += g * f[c];
                }
            }
        }
        Ok(())
    }
}

struct Sgd {
    lr: f32,
}

impl Optimizer<ChannelMeanClassifier> for Sgd {
    fn zero_grad(&mut self, model: &mut ChannelMeanClassifier) {
        model.grad_w.iter_mut().for_each(|g| *g = 0.0);
        model.grad_b.iter_mut().for_each(|g| *g = 0.0);
    }

    fn step(&mut self, model: &mut ChannelMeanClassifier) -> bazaar::train::Result<()> {
        for (w, g) in model.w.iter_mut().zip(&model.grad_w) {
            *w -= self.lr * g;
        }
        for (b, g) in model.b.iter_mut().zip(&model.grad_b) {
            *b -= self.lr * g;
        }
        Ok(())
    }
}

/// Softmax cross-entropy, averaged over the batch.
struct CrossEntropy;

impl LossFn for CrossEntropy {
    fn compute(&self, logits: &Logits, targets: &[usize]) -> bazaar::train::Result<LossOutput> {
        let (batch, classes) = (logits.batch(), logits.classes());
        let mut value = 0.0f64;
        let mut grad = vec![0.0f32; batch * classes];
        for i in 0..batch {
            let row = logits.row(i);
            let max = row.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
            let exps: Vec<f32> = row.iter().map(|v| (v - max).exp()).collect();
            let sum: f32 = exps.iter().sum();
            for c in 0..classes {
                let p = exps[c] / sum;
                let target = if targets[i] == c { 1.0f32 } else { 0.0 };
                grad[i * classes + c] = (p - target) / batch as f32;
                if targets[i] == c {
                    value -= f64::from(p.max(1e-12).ln());
                }
            }
        }
        Ok(LossOutput {
            value: value / batch as f64,
            grad: Logits::new(grad, batch, classes),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

fn main() -> Result<(), Box<dyn Error>> {
    let cfg = parse_args();
    let out_dir = PathBuf::from(&cfg.out_dir);
    fs::create_dir_all(&out_dir)?;

    println!("=== Bazaar — Product Catalog Image Classification ===");
    println!();

    // ─────────────────────────────────────────────────────────────────────
    // 1. Load or synthesize the catalog
    // ─────────────────────────────────────────────────────────────────────
    let catalog_dir = match &cfg.data_dir {
        Some(dir) => {
            println!("Loading catalog from: {dir}");
            PathBuf::from(dir)
        }
        None => {
            println!(
                "Writing synthetic catalog ({} categories x {} images)",
                SYNTHETIC_CLASSES.len(),
                cfg.per_class
            );
            println!("  Tip: use --data-dir <path> for a real catalog");
            write_synthetic_catalog(&out_dir, cfg.per_class, cfg.seed)?
        }
    };

    let manifest = Manifest::from_csv_path(
        catalog_dir.join("manifest.csv"),
        &catalog_dir,
        ManifestConfig::default(),
    )?;
    let dataset = ProductImageDataset::builder(manifest).build()?;
    let [channels, height, width] = dataset.sample_shape();

    println!("  Images: {}", dataset.len());
    println!("  Categories: {:?}", dataset.class_names());
    println!("  Sample shape: {channels}x{height}x{width} (CHW)");
    println!();

    // ─────────────────────────────────────────────────────────────────────
    // 2. Split and loaders
    // ─────────────────────────────────────────────────────────────────────
    let run = RunConfig::default().batch_size(cfg.batch_size).seed(cfg.seed);
    let (mut train_loader, mut val_loader) = build_loaders(&dataset, &run)?;

    println!("Loaders:");
    println!("  Batch size: {}", cfg.batch_size);
    println!(
        "  Train: {} samples, {} batches/epoch (shuffled, flip p={DEFAULT_FLIP_PROB})",
        train_loader.len(),
        train_loader.num_batches()
    );
    println!(
        "  Validation: {} samples, {} batches",
        val_loader.len(),
        val_loader.num_batches()
    );
    println!();

    // ─────────────────────────────────────────────────────────────────────
    // 3. Model, optimizer, loss
    // ─────────────────────────────────────────────────────────────────────
    let mut model = ChannelMeanClassifier::new(dataset.num_classes(), cfg.seed);
    let mut optimizer = Sgd { lr: cfg.lr };
    let loss_fn = CrossEntropy;

    println!(
        "Model: channel means → Linear(3→{}), {} parameters",
        dataset.num_classes(),
        model.num_params()
    );
    println!("Optimizer: SGD (lr={})", cfg.lr);
    println!();

    // ─────────────────────────────────────────────────────────────────────
    // 4. Training loop
    // ─────────────────────────────────────────────────────────────────────
    println!("Training for {} epochs...", cfg.epochs);
    println!("{:-<72}", "");

    let mut recorder = ScalarRecorder::new();
    let mut epoch_numbers = Vec::with_capacity(cfg.epochs);
    let mut train_losses = Vec::with_capacity(cfg.epochs);
    let mut val_losses = Vec::with_capacity(cfg.epochs);

    for epoch in 1..=cfg.epochs {
        let train = train_epoch(
            &mut model,
            train_loader.iter_epoch(),
            &mut optimizer,
            &loss_fn,
        )?;
        for &loss in &train.batch_losses {
            recorder.record_scalar("train_loss", loss);
        }

        let val = validate_epoch(&mut model, val_loader.iter_epoch(), &loss_fn)?;
        for &loss in &val.batch_losses {
            recorder.record_scalar("val_loss", loss);
        }

        println!(
            "  Epoch {}/{} | Loss: {:.4} | Train Acc: {:.1}% | Val Loss: {:.4} | Val Acc: {:.1}%",
            epoch, cfg.epochs, train.avg_loss, train.accuracy, val.avg_loss, val.accuracy
        );

        epoch_numbers.push(epoch);
        train_losses.push(train.avg_loss);
        val_losses.push(val.avg_loss);
    }

    println!("{:-<72}", "");
    println!();

    // ─────────────────────────────────────────────────────────────────────
    // 5. Confusion matrix on the validation split
    // ─────────────────────────────────────────────────────────────────────
    let (targets, predictions) = collect_predictions(&mut model, val_loader.iter_epoch())?;
    let val_acc = accuracy(&predictions, &targets) * 100.0;
    let matrix = ConfusionMatrix::from_labels(&targets, &predictions, dataset.class_names())?;

    println!("Validation accuracy: {val_acc:.1}% ({} samples)", targets.len());
    println!();
    println!("{}", matrix.to_string_table());

    // ─────────────────────────────────────────────────────────────────────
    // 6. Sample predictions
    // ─────────────────────────────────────────────────────────────────────
    if let Some(first) = val_loader.iter_epoch().next() {
        let batch = first?;
        let logits = model.forward(&batch, Mode::Eval)?;
        let predicted = logits.argmax_classes();
        let n_show = 8.min(batch.len());

        println!("Sample predictions (first {n_show}):");
        for i in 0..n_show {
            let pred = dataset.codec().decode(predicted[i])?;
            let actual = dataset.codec().decode(batch.labels[i])?;
            let mark = if pred == actual { "OK" } else { "MISS" };
            println!("  [{mark:>4}] predicted: {pred:<10} actual: {actual}");
        }
        println!();
    }

    // ─────────────────────────────────────────────────────────────────────
    // 7. Artifacts
    // ─────────────────────────────────────────────────────────────────────
    let curves_path = out_dir.join("loss_curves.png");
    let heatmap_path = out_dir.join("confusion.png");
    let scalars_path = out_dir.join("scalars.jsonl");

    plot_curves(&curves_path, &epoch_numbers, &train_losses, &val_losses)?;
    matrix.render_heatmap(&heatmap_path)?;
    recorder.write_jsonl(&scalars_path)?;

    println!("Wrote:");
    println!("  {}", curves_path.display());
    println!("  {}", heatmap_path.display());
    println!("  {}", scalars_path.display());
    println!();
    println!("=== Done! ===");

    Ok(())
}
