use super::{json_pretty, spin_fail, spin_ok, spinner, EXIT_SUCCESS};
use esdmedia_catalog::{
    CabextractTool, CatalogRecord, HttpTransport, ResolveRequest, Resolver, CATALOG_XML,
};

pub fn run(request: &ResolveRequest, urls_only: bool, json: bool) -> Result<u8, String> {
    let transport = HttpTransport::new();
    let extractor = CabextractTool::new();
    let resolver = Resolver::new(&transport, &extractor);

    let fetching = request.refresh || !request.work_dir.join(CATALOG_XML).is_file();
    let pb = fetching.then(|| spinner("fetching catalog…"));

    let records = resolver.resolve(request).map_err(|e| {
        if let Some(ref pb) = pb {
            spin_fail(pb, "catalog resolution failed");
        }
        e.to_string()
    })?;
    if let Some(ref pb) = pb {
        spin_ok(pb, "catalog ready");
    }

    if json {
        println!("{}", json_pretty(&records)?);
    } else if urls_only {
        for record in &records {
            println!("{}", record.url);
        }
    } else {
        for (i, record) in records.iter().enumerate() {
            if i > 0 {
                println!();
            }
            print_record(record);
        }
    }
    Ok(EXIT_SUCCESS)
}

fn print_record(record: &CatalogRecord) {
    println!("{:<14}{}", "Name:", record.name);
    println!("{:<14}{}", "URL:", record.url);
    println!("{:<14}{}", "Language:", record.language);
    println!("{:<14}{}", "Architecture:", record.architecture);
    println!("{:<14}{}", "Business:", if record.business { "yes" } else { "no" });
}
