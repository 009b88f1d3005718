use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::path::PathBuf;

use xml::reader::EventReader;
use xml::attribute::OwnedAttribute;
use yaml_rust::Yaml;

use super::error::{ModelError, Result};


pub fn xml_parser_from_path(path: &Path) -> Result<EventReader<BufReader<File>>> {
    let file = File::open(path)?;
    let file = BufReader::new(file);
    Ok(EventReader::new(file))
}

pub fn get_xml_attribute_value(attributes: &Vec<OwnedAttribute>, attr_name: &str)
                               -> Option<String> {
    match attributes.iter().find(|attr| attr.name.local_name == attr_name) {
        Some(attr) => Some(attr.value.clone()),
        None => None,
    }
}

pub fn str_to_absolute_path(path_str: &str, default_base_dir: &Path) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        return path;
    } else {
        return [default_base_dir, Path::new(&path)].iter().collect();
    }
}

/// Reads a number that may have been written as an integer ("5") or a real ("5.0").
/// Returns Ok(None) if the key is absent.
pub fn yaml_opt_f64(yaml: &Yaml, key: &str) -> Result<Option<f64>> {
    let value = &yaml[key];
    match value {
        Yaml::BadValue | Yaml::Null => Ok(None),
        Yaml::Integer(ii) => Ok(Some(*ii as f64)),
        Yaml::Real(_) => value.as_f64().map(Some).ok_or_else(|| ModelError::Config(
            format!("{} is not a number", key))),
        _ => Err(ModelError::Config(format!("{} must be a number", key))),
    }
}

pub fn yaml_opt_bool(yaml: &Yaml, key: &str) -> Result<Option<bool>> {
    match &yaml[key] {
        Yaml::BadValue | Yaml::Null => Ok(None),
        Yaml::Boolean(bb) => Ok(Some(*bb)),
        _ => Err(ModelError::Config(format!("{} must be true or false", key))),
    }
}

/// Like `yaml_opt_f64`, but for non-negative integers.
pub fn yaml_opt_u64(yaml: &Yaml, key: &str) -> Result<Option<u64>> {
    match &yaml[key] {
        Yaml::BadValue | Yaml::Null => Ok(None),
        Yaml::Integer(ii) if *ii >= 0 => Ok(Some(*ii as u64)),
        _ => Err(ModelError::Config(format!("{} must be a non-negative integer", key))),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use yaml_rust::YamlLoader;

    #[test]
    fn test_yaml_numbers() {
        let docs = YamlLoader::load_from_str("aa: 5\nbb: 2.5\ncc: yes please\ndd: -3\nee: true")
            .unwrap();
        let doc = &docs[0];
        assert_eq!(yaml_opt_f64(doc, "aa").unwrap(), Some(5.));
        assert_eq!(yaml_opt_f64(doc, "bb").unwrap(), Some(2.5));
        assert_eq!(yaml_opt_f64(doc, "missing").unwrap(), None);
        assert!(yaml_opt_f64(doc, "cc").is_err());
        assert!(yaml_opt_u64(doc, "dd").is_err());
        assert_eq!(yaml_opt_u64(doc, "aa").unwrap(), Some(5));
        assert_eq!(yaml_opt_bool(doc, "ee").unwrap(), Some(true));
        assert!(yaml_opt_bool(doc, "aa").is_err());
    }

    #[test]
    fn test_str_to_absolute_path() {
        let base = Path::new("/data/configs");
        assert_eq!(str_to_absolute_path("net.graphml", base),
                   PathBuf::from("/data/configs/net.graphml"));
        assert_eq!(str_to_absolute_path("/abs/net.graphml", base),
                   PathBuf::from("/abs/net.graphml"));
    }
}
