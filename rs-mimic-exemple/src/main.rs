use rs_mimic_core::io::{get_filename, list_files, normalize_folder, read_file};
use rs_mimic_core::{AuthorId, ChainConfig, CorpusStore, Generator, NoveltyFilter, SnapshotFormat};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Keep at most 500 lines per author (and in the default dataset)
    // and build chains over pairs of words
    let mut config = ChainConfig {
        max_limit: 500,
        order: 2,
        ..ChainConfig::default()
    };

    // Reject lines that copy too long a run of words from the training data
    // (the models then keep their training text around)
    config.novelty = Some(NoveltyFilter::default());
    config.validate()?;

    // Load the corpus from "data/corpus.json"
    // The file is created (empty) if it does not exist yet
    let folder = normalize_folder("./data");
    let snapshot = folder.join("corpus.json");
    let store = CorpusStore::open(&snapshot, SnapshotFormat::Json, config.corpus_settings()?)?;

    // Every .txt file is one author, every line one message
    // 'alice.txt' → author "alice"
    for file in list_files(&folder, "txt")? {
        let author = AuthorId::new(get_filename(&file)?)?;
        for line in read_file(folder.join(&file))? {
            store.add(&author, &line);
        }
    }

    let generator = Generator::new(config.generation_input()?);

    // Generate 3 lines per author
    for (author, entries) in store.authors() {
        let model = generator.build_model(config.order, &store.get(&author))?;
        println!("{author} ({entries} lines):");
        for _ in 0..3 {
            match generator.generate(&model) {
                Ok(line) => println!("  {line}"),
                Err(e) => println!("  <{e}>"),
            }
        }
    }

    // An author nobody has seen falls back to the default dataset
    let stranger = AuthorId::from(0);
    let model = generator.build_model(config.order, &store.get(&stranger))?;
    match generator.generate(&model) {
        Ok(line) => println!("Anyone: {line}"),
        Err(e) => println!("Anyone: <{e}>"),
    }

    // The whole corpus is rewritten, nothing is appended
    store.save(&snapshot, SnapshotFormat::Json)?;

    Ok(())
}
