use crate::*;

#[derive(Serialize)]
struct EmbeddingBody<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

/// One vector per input, in input order.
#[instrument(skip(config, inputs), fields(inputs = inputs.len()), err)]
pub async fn embed(config: &OpenAiConfig, model: &str, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
    if inputs.is_empty() {
        return Ok(Vec::new());
    }

    let body = EmbeddingBody {
        model,
        input: inputs,
    };
    let response: EmbeddingResponse = post_json(config, "embeddings", &body).await?;

    Ok(in_input_order(response.data))
}

fn in_input_order(mut data: Vec<EmbeddingData>) -> Vec<Vec<f32>> {
    data.sort_by_key(|d| d.index);
    data.into_iter().map(|d| d.embedding).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_follow_the_index_field() {
        let response: EmbeddingResponse = serde_json::from_value(serde_json::json!({
            "object": "list",
            "data": [
                { "object": "embedding", "index": 1, "embedding": [0.0, 1.0] },
                { "object": "embedding", "index": 0, "embedding": [1.0, 0.0] }
            ]
        }))
        .unwrap();

        assert_eq!(
            in_input_order(response.data),
            vec![vec![1.0, 0.0], vec![0.0, 1.0]]
        );
    }

    #[tokio::test]
    async fn no_inputs_skip_the_request() {
        let config = OpenAiConfig::new("key", "http://127.0.0.1:9");

        assert!(embed(&config, "model", &[]).await.unwrap().is_empty());
    }
}
