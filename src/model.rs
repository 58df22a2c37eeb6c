/*!
 * Evaluate a gradient boosted tree ensemble saved in the LightGBM text format.
 *
 * Only what is needed to score a single binary classifier or regressor is supported: numerical
 * splits with LightGBM's missing value handling, and a sigmoid or identity output transform.
 * Categorical splits and multi-class models are rejected when the file is loaded.
 */
use crate::{
    error::{ForesightError, ForesightResult},
    row::{feature_index, FeatureRow, FEATURE_NAMES},
    scorer::RiskScorer,
};
use rustc_hash::FxHashMap as HashMap;
use std::{path::Path, str::FromStr};

const CATEGORICAL_MASK: u8 = 1;
const DEFAULT_LEFT_MASK: u8 = 2;
const ZERO_THRESHOLD: f64 = 1.0e-35;

static_assertions::assert_impl_all!(LightGbmModel: Send, Sync);

/// How a missing value is recognized at a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MissingType {
    None,
    Zero,
    NaN,
}

impl MissingType {
    fn from_decision_type(decision_type: u8) -> Self {
        match (decision_type >> 2) & 3 {
            1 => MissingType::Zero,
            2 => MissingType::NaN,
            _ => MissingType::None,
        }
    }
}

/// How the summed raw score is turned into the model output.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Transform {
    Identity,
    Sigmoid(f64),
}

impl Transform {
    fn from_objective(objective: &str) -> ForesightResult<Self> {
        let mut parts = objective.split_whitespace();
        let name = parts.next().unwrap_or("");

        match name {
            "binary" => {
                let mut sigmoid: f64 = 1.0;
                for part in parts {
                    if let Some(val) = part.strip_prefix("sigmoid:") {
                        sigmoid = val.parse()?;
                    }
                }
                Ok(Transform::Sigmoid(sigmoid))
            }
            "cross_entropy" | "xentropy" => Ok(Transform::Sigmoid(1.0)),
            "regression" | "regression_l1" | "huber" | "fair" | "quantile" | "mape" => {
                Ok(Transform::Identity)
            }
            _ => {
                let msg = format!("unsupported objective '{}'", name);
                Err(ForesightError::ModelFormat(msg).into())
            }
        }
    }

    fn apply(&self, raw: f64) -> f64 {
        match self {
            Transform::Identity => raw,
            Transform::Sigmoid(s) => 1.0 / (1.0 + (-s * raw).exp()),
        }
    }
}

/// A single decision tree.
///
/// Internal nodes are indexed from 0, a negative child `c` refers to leaf `!c`.
#[derive(Debug, Clone)]
struct Tree {
    split_feature: Vec<usize>,
    threshold: Vec<f64>,
    decision_type: Vec<u8>,
    left_child: Vec<i32>,
    right_child: Vec<i32>,
    leaf_value: Vec<f64>,
}

impl Tree {
    fn parse(
        idx: usize,
        fields: &HashMap<&str, &str>,
        num_features: usize,
    ) -> ForesightResult<Self> {
        let num_leaves: usize = required(fields, "num_leaves", idx)?.trim().parse()?;
        let leaf_value: Vec<f64> = parse_list(required(fields, "leaf_value", idx)?)?;

        if num_leaves == 0 {
            return Err(tree_error(idx, "a tree needs at least one leaf"));
        }

        if leaf_value.len() != num_leaves {
            return Err(tree_error(idx, "leaf_value does not match num_leaves"));
        }

        if num_leaves == 1 {
            return Ok(Tree {
                split_feature: vec![],
                threshold: vec![],
                decision_type: vec![],
                left_child: vec![],
                right_child: vec![],
                leaf_value,
            });
        }

        let tree = Tree {
            split_feature: parse_list(required(fields, "split_feature", idx)?)?,
            threshold: parse_list(required(fields, "threshold", idx)?)?,
            decision_type: parse_list(required(fields, "decision_type", idx)?)?,
            left_child: parse_list(required(fields, "left_child", idx)?)?,
            right_child: parse_list(required(fields, "right_child", idx)?)?,
            leaf_value,
        };

        let num_nodes = num_leaves - 1;
        if tree.split_feature.len() != num_nodes
            || tree.threshold.len() != num_nodes
            || tree.decision_type.len() != num_nodes
            || tree.left_child.len() != num_nodes
            || tree.right_child.len() != num_nodes
        {
            return Err(tree_error(idx, "node arrays do not match num_leaves"));
        }

        if tree.split_feature.iter().any(|&f| f >= num_features) {
            return Err(tree_error(idx, "split on an unknown feature"));
        }

        if tree.decision_type.iter().any(|&d| d & CATEGORICAL_MASK != 0) {
            return Err(tree_error(idx, "categorical splits are not supported"));
        }

        // Children are always created after their parent, which also rules out cycles.
        for node in 0..num_nodes {
            for &child in [tree.left_child[node], tree.right_child[node]].iter() {
                let valid = if child < 0 {
                    ((!child) as usize) < num_leaves
                } else {
                    (child as usize) > node && (child as usize) < num_nodes
                };

                if !valid {
                    return Err(tree_error(idx, "child index out of range"));
                }
            }
        }

        Ok(tree)
    }

    fn predict(&self, values: &[f64]) -> f64 {
        if self.split_feature.is_empty() {
            return self.leaf_value[0];
        }

        let mut node = 0;
        loop {
            let next = self.decide(node, values[self.split_feature[node]]);
            if next < 0 {
                return self.leaf_value[(!next) as usize];
            }
            node = next as usize;
        }
    }

    fn decide(&self, node: usize, mut fval: f64) -> i32 {
        let decision_type = self.decision_type[node];
        let missing_type = MissingType::from_decision_type(decision_type);

        if fval.is_nan() && missing_type != MissingType::NaN {
            fval = 0.0;
        }

        let is_missing = match missing_type {
            MissingType::Zero => (-ZERO_THRESHOLD..=ZERO_THRESHOLD).contains(&fval),
            MissingType::NaN => fval.is_nan(),
            MissingType::None => false,
        };

        let go_left = if is_missing {
            decision_type & DEFAULT_LEFT_MASK != 0
        } else {
            fval <= self.threshold[node]
        };

        if go_left {
            self.left_child[node]
        } else {
            self.right_child[node]
        }
    }
}

fn required<'a>(
    fields: &HashMap<&str, &'a str>,
    key: &str,
    idx: usize,
) -> ForesightResult<&'a str> {
    fields
        .get(key)
        .copied()
        .ok_or_else(|| tree_error(idx, &format!("missing '{}'", key)))
}

fn tree_error(idx: usize, msg: &str) -> Box<dyn std::error::Error> {
    ForesightError::ModelFormat(format!("tree {}: {}", idx, msg)).into()
}

fn parse_list<T>(list: &str) -> ForesightResult<Vec<T>>
where
    T: FromStr,
    <T as FromStr>::Err: std::error::Error + 'static,
{
    let mut vals = vec![];
    for token in list.split_whitespace() {
        vals.push(token.parse()?);
    }
    Ok(vals)
}

/// A trained LightGBM model.
#[derive(Debug, Clone)]
pub struct LightGbmModel {
    /// For each model input, its position in [FeatureRow::values].
    features: Vec<usize>,
    trees: Vec<Tree>,
    transform: Transform,
    average_output: bool,
}

impl LightGbmModel {
    /// Load a model from a LightGBM text model file.
    pub fn load<P: AsRef<Path>>(path: P) -> ForesightResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Parse the contents of a LightGBM text model file.
    pub fn parse(text: &str) -> ForesightResult<Self> {
        let mut header: HashMap<&str, &str> = HashMap::default();
        let mut tree_blocks: Vec<HashMap<&str, &str>> = vec![];

        for line in text.lines().map(str::trim) {
            if line == "end of trees" {
                break;
            }

            if line.starts_with("Tree=") {
                tree_blocks.push(HashMap::default());
                continue;
            }

            let (key, value) = match line.split_once('=') {
                Some(kv) => kv,
                None => {
                    // Bare flags such as "average_output" and the leading "tree" line.
                    if tree_blocks.is_empty() && !line.is_empty() {
                        header.insert(line, "");
                    }
                    continue;
                }
            };

            match tree_blocks.last_mut() {
                Some(block) => block.insert(key, value),
                None => header.insert(key, value),
            };
        }

        if let Some(num_class) = header.get("num_class") {
            if num_class.trim() != "1" {
                return Err(ForesightError::ModelFormat(format!(
                    "only single class models are supported, found num_class={}",
                    num_class
                ))
                .into());
            }
        }

        let names = header
            .get("feature_names")
            .ok_or_else(|| ForesightError::ModelFormat("missing feature_names".to_owned()))?;

        let mut features = vec![];
        for name in names.split_whitespace() {
            let idx = feature_index(name).ok_or_else(|| {
                ForesightError::ModelFormat(format!(
                    "model feature '{}' is not one of {:?}",
                    name, FEATURE_NAMES
                ))
            })?;
            features.push(idx);
        }

        let transform = Transform::from_objective(header.get("objective").copied().unwrap_or(""))?;
        let average_output = header.contains_key("average_output");

        let mut trees = Vec::with_capacity(tree_blocks.len());
        for (idx, block) in tree_blocks.iter().enumerate() {
            trees.push(Tree::parse(idx, block, features.len())?);
        }

        if trees.is_empty() {
            return Err(ForesightError::ModelFormat("no trees in model".to_owned()).into());
        }

        log::debug!(
            "loaded model with {} trees over {} features",
            trees.len(),
            features.len()
        );

        Ok(LightGbmModel {
            features,
            trees,
            transform,
            average_output,
        })
    }

    /// The number of trees in the ensemble.
    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    /// The model output for a row, after the output transform.
    pub fn predict(&self, row: &FeatureRow) -> f64 {
        let all = row.values();
        let inputs: Vec<f64> = self.features.iter().map(|&idx| all[idx]).collect();

        let mut raw: f64 = self.trees.iter().map(|tree| tree.predict(&inputs)).sum();
        if self.average_output {
            raw /= self.trees.len() as f64;
        }

        self.transform.apply(raw)
    }
}

impl RiskScorer for LightGbmModel {
    fn score(&self, features: &FeatureRow) -> Result<f64, ForesightError> {
        Ok(self.predict(features))
    }
}
