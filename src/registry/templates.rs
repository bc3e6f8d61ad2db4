//! Build context contents for the local workloads.

pub const FLASK_DOCKERFILE: &str = r#"FROM python:3.9
WORKDIR /app
COPY app.py /app
RUN pip install flask scikit-learn numpy
CMD ["python", "app.py"]
"#;

pub const FLASK_APP: &str = r#"from flask import Flask, request, jsonify
from sklearn.linear_model import LinearRegression
import numpy as np

app = Flask(__name__)

def predict_marks(hours):
    X = np.array([[1], [2], [3], [4], [5]])
    y = np.array([50, 60, 65, 70, 80])
    model = LinearRegression()
    model.fit(X, y)
    return model.predict([[hours]])[0]

@app.route('/predict', methods=['GET'])
def predict():
    try:
        hours = float(request.args.get("hours", 0))
        result = predict_marks(hours)
        return jsonify({"predicted_marks": result})
    except ValueError:
        return jsonify({"error": "Invalid input"}), 400

if __name__ == '__main__':
    app.run(host='0.0.0.0')
"#;

pub const DIND_DOCKERFILE: &str = r#"FROM docker:dind
CMD ["dockerd-entrypoint.sh"]
"#;

pub const APACHE_DOCKERFILE: &str = r#"FROM httpd:latest
COPY ./apache_html/ /usr/local/apache2/htdocs/
"#;

pub const APACHE_INDEX: &str = "<h1>Welcome to Apache Server in Docker!</h1>\n";
