//! Fixed instructional prompts for answer synthesis.

/// Classification-mode prompt: asks for a strict JSON claim decision.
pub fn claim_analysis_prompt(question: &str, clause_context: &str) -> String {
    format!(
        "You are an insurance claim analyst. Based on the user query and clause, decide the claim outcome.\n\
        \n\
        Query: {question}\n\
        \n\
        Clause: {clause_context}\n\
        \n\
        Analyze if the claim should be approved or rejected based on the clause conditions. \
        Return only a JSON response with these exact fields:\n\
        - decision: \"Approved\" or \"Rejected\"\n\
        - amount: estimated amount like \"₹50000\" or \"N/A\" if rejected\n\
        - justification: brief explanation based on the clause\n\
        \n\
        Response:"
    )
}

/// Open-QA prompt: a direct answer grounded in the provided clauses only.
pub fn open_answer_prompt(question: &str, clause_context: &str) -> String {
    format!(
        "You are an insurance policy assistant. Answer the question using only the policy clauses below. \
        If the clauses do not contain the answer, say that the policy does not provide this information.\n\
        \n\
        Clauses: {clause_context}\n\
        \n\
        Question: {question}\n\
        \n\
        Answer:"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_prompt_embeds_question_and_context() {
        let p = claim_analysis_prompt("Is my surgery covered?", "Surgery is covered after 24 months");
        assert!(p.contains("Is my surgery covered?"));
        assert!(p.contains("after 24 months"));
        assert!(p.contains("decision"));
    }
}
