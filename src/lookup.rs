use anyhow::{Result, bail};
use log::{info, warn};

use crate::{
    cli::LookupArgs,
    config::Config,
    reference::{CropInfo, ReferenceData},
    table,
};

pub fn execute(args: &LookupArgs, config: &Config) -> Result<()> {
    let reference = ReferenceData::new(config.reference.clone());

    if let Some(code) = args.variable.as_deref() {
        let Some(info) = reference.variable(code) else {
            bail!("Variable '{code}' is not defined in {}", config.reference.variable_file);
        };
        let headers = vec!["code".to_string(), "label".to_string(), "description".to_string()];
        let rows = vec![vec![
            info.code.clone(),
            info.label.clone(),
            info.description.clone(),
        ]];
        table::print_table(&headers, &rows);
        return Ok(());
    }

    if let Some(code) = args.crop.as_deref() {
        let Some(crop) = reference.crop(code) else {
            bail!("Crop '{code}' is not registered in {}", config.reference.detail_file);
        };
        print_crops(&[crop]);
        return Ok(());
    }

    if args.crops {
        let crops = reference.crops();
        if crops.is_empty() {
            warn!("No crops registered; check {} and the search paths", config.reference.detail_file);
            return Ok(());
        }
        print_crops(&crops);
        info!("Listed {} crop(s)", crops.len());
        return Ok(());
    }

    bail!("Specify --variable CODE, --crop CODE, or --crops")
}

fn print_crops(crops: &[&CropInfo]) {
    let headers = vec!["code".to_string(), "name".to_string(), "directory".to_string()];
    let rows = crops
        .iter()
        .map(|crop| {
            vec![
                crop.code.clone(),
                crop.name.clone(),
                crop.directory
                    .as_ref()
                    .map(|dir| dir.display().to_string())
                    .unwrap_or_default(),
            ]
        })
        .collect::<Vec<_>>();
    table::print_table(&headers, &rows);
}
